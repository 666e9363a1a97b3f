//! # Input Validation: Filenames
//!
//! Tarball filenames arrive straight from request paths and publish payloads,
//! and are joined onto a package directory. They must stay a single, plain
//! path component.

use crate::validation::error::{ValidationError, ValidationResult};
use crate::validation::limits::MAX_FILENAME_LENGTH;

const RESERVED_WINDOWS_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Validate a filename to prevent path traversal and other filesystem tricks.
pub fn validate_filename(filename: &str) -> ValidationResult<()> {
    if filename.is_empty() {
        return Err(ValidationError::TooShort { actual: 0, min: 1 });
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::TooLong {
            actual: filename.len(),
            max: MAX_FILENAME_LENGTH,
        });
    }

    if filename.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    if filename.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters);
    }

    if filename.contains("..") {
        return Err(ValidationError::PathTraversal {
            path: filename.to_string(),
        });
    }

    if filename.starts_with('/') || filename.starts_with('\\') {
        return Err(ValidationError::AbsolutePath {
            path: filename.to_string(),
        });
    }

    if filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidCharacters {
            input: filename.to_string(),
        });
    }

    let mut chars = filename.chars();
    if let (Some(first), Some(':')) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() {
            return Err(ValidationError::AbsolutePath {
                path: filename.to_string(),
            });
        }
    }

    let base_name = filename
        .rfind('.')
        .map(|dot| &filename[..dot])
        .unwrap_or(filename);
    if RESERVED_WINDOWS_NAMES
        .iter()
        .any(|reserved| base_name.eq_ignore_ascii_case(reserved))
    {
        return Err(ValidationError::InvalidFormat {
            reason: format!("Filename '{base_name}' is reserved on Windows systems"),
        });
    }

    Ok(())
}
