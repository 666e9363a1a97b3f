//! # Input Validation: HTTP
//!
//! Hostnames and ports for binding, `Host` headers that get embedded into
//! tarball URLs, and base64 attachment payloads.

use crate::validation::error::{ValidationError, ValidationResult};
use crate::validation::limits::MAX_BASE64_ENCODED_SIZE;
use once_cell::sync::Lazy;
use regex::Regex;

/// RFC 1123 hostname (dotted IPv4 literals match as well)
static HOSTNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("Hostname regex should compile - this is a static RFC 1123 pattern")
});

/// `host`, `host:port` or `[v6]:port` as seen in a `Host` header
static HOST_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\[[0-9a-fA-F:.]+\]|[a-zA-Z0-9]([a-zA-Z0-9.-]{0,251}[a-zA-Z0-9])?)(:[0-9]{1,5})?$")
        .expect("Host header regex should compile - this is a static pattern")
});

/// Validate a hostname to bind the server to.
pub fn validate_hostname(hostname: &str) -> ValidationResult<String> {
    if hostname.is_empty() {
        return Err(ValidationError::TooShort { actual: 0, min: 1 });
    }

    if hostname.len() > 253 {
        return Err(ValidationError::TooLong {
            actual: hostname.len(),
            max: 253,
        });
    }

    if hostname.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    if hostname.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters);
    }

    if !HOSTNAME_REGEX.is_match(hostname) {
        return Err(ValidationError::InvalidCharacters {
            input: hostname.to_string(),
        });
    }

    Ok(hostname.to_string())
}

/// Validate a listening port. Port 0 is rejected so the advertised address is stable.
pub fn validate_port(port: u16) -> ValidationResult<u16> {
    if port == 0 {
        return Err(ValidationError::InvalidFormat {
            reason: "Port number must be between 1-65535".to_string(),
        });
    }
    Ok(port)
}

/// Validate a `Host` header before it is embedded in a tarball URL.
pub fn validate_host_header(host: &str) -> ValidationResult<String> {
    if host.is_empty() {
        return Err(ValidationError::TooShort { actual: 0, min: 1 });
    }

    if host.len() > 260 {
        return Err(ValidationError::TooLong {
            actual: host.len(),
            max: 260,
        });
    }

    if !HOST_HEADER_REGEX.is_match(host) {
        return Err(ValidationError::InvalidCharacters {
            input: host.to_string(),
        });
    }

    Ok(host.to_string())
}

/// Reject oversized base64 payloads before decoding them.
///
/// `max_decoded_size` is compared against the estimated decoded length
/// (3 bytes per 4 characters).
pub fn validate_base64_size(encoded_data: &str, max_decoded_size: u64) -> ValidationResult<()> {
    if encoded_data.len() > MAX_BASE64_ENCODED_SIZE {
        return Err(ValidationError::TooLarge {
            actual: encoded_data.len() as u64,
            max: MAX_BASE64_ENCODED_SIZE as u64,
        });
    }

    let estimated_decoded_size = (encoded_data.len() as u64 * 3) / 4;
    if estimated_decoded_size > max_decoded_size {
        return Err(ValidationError::TooLarge {
            actual: estimated_decoded_size,
            max: max_decoded_size,
        });
    }

    Ok(())
}

/// Validate that base64 data contains only standard-alphabet characters.
pub fn validate_base64_characters(data: &str) -> ValidationResult<()> {
    if data.is_empty() {
        return Err(ValidationError::TooShort { actual: 0, min: 1 });
    }

    if !data
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
    {
        return Err(ValidationError::InvalidCharacters {
            input: "Invalid base64 characters detected".to_string(),
        });
    }

    Ok(())
}
