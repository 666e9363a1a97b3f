//! # Input Validation: Package Names and Versions
//!
//! Names and versions both end up as filesystem path components, so they are
//! held to npm's conservative character set before any path is derived.

use crate::validation::error::{ValidationError, ValidationResult};
use crate::validation::limits::{MAX_PACKAGE_NAME_LENGTH, MAX_VERSION_LENGTH};

fn check_common(input: &str, max: usize) -> ValidationResult<()> {
    if input.is_empty() {
        return Err(ValidationError::TooShort { actual: 0, min: 1 });
    }

    if input.len() > max {
        return Err(ValidationError::TooLong {
            actual: input.len(),
            max,
        });
    }

    if input.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    if input.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters);
    }

    Ok(())
}

/// Validate an npm package name.
///
/// Accepts lowercase ASCII letters, digits, `.`, `-` and `_`, and rejects
/// names starting with `.` or `_`. Scoped names (`@scope/name`) are not
/// accepted because the name maps to a single directory under the data root.
pub fn validate_package_name(name: &str) -> ValidationResult<String> {
    check_common(name, MAX_PACKAGE_NAME_LENGTH)?;

    if name.starts_with('@') {
        return Err(ValidationError::InvalidFormat {
            reason: format!("scoped packages are not supported by this registry: {name}"),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(ValidationError::InvalidCharacters {
            input: name.to_string(),
        });
    }

    if name.starts_with('.') || name.starts_with('_') {
        return Err(ValidationError::InvalidFormat {
            reason: "npm package names cannot start with . or _".to_string(),
        });
    }

    if name.to_lowercase() != name {
        return Err(ValidationError::InvalidFormat {
            reason: "npm package names must be lowercase".to_string(),
        });
    }

    Ok(name.to_string())
}

/// Validate a version string used verbatim in a tarball filename.
pub fn validate_version(version: &str) -> ValidationResult<String> {
    check_common(version, MAX_VERSION_LENGTH)?;

    if !version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
    {
        return Err(ValidationError::InvalidCharacters {
            input: version.to_string(),
        });
    }

    if version.contains("..") {
        return Err(ValidationError::PathTraversal {
            path: version.to_string(),
        });
    }

    Ok(version.to_string())
}
