//! # Input Validation: Size Limits
//!
//! Hard ceilings that apply regardless of configuration.

use crate::validation::error::{ValidationError, ValidationResult};

/// Maximum allowed package name length (npm rule)
pub const MAX_PACKAGE_NAME_LENGTH: usize = 214;

/// Maximum allowed version string length
pub const MAX_VERSION_LENGTH: usize = 64;

/// Maximum allowed filename length
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum allowed base64 encoded attachment size (110 MB)
pub const MAX_BASE64_ENCODED_SIZE: usize = 110 * 1024 * 1024;

/// Validate a byte count against a limit.
pub fn validate_size(size: u64, max: u64) -> ValidationResult<()> {
    if size > max {
        return Err(ValidationError::TooLarge { actual: size, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_size() {
        assert!(validate_size(1024, 2048).is_ok());
        assert!(validate_size(2048, 2048).is_ok());
        assert!(validate_size(2049, 2048).is_err());
    }
}
