//! # Input Validation Utilities
//!
//! Security-focused checks applied to everything that flows from a request
//! into a filesystem path or an outgoing URL: package names, versions,
//! tarball filenames, `Host` headers and base64 attachments.

pub mod error;
pub mod http;
pub mod limits;
pub mod manifests;
pub mod paths;

pub use self::{
    error::{ValidationError, ValidationResult},
    http::{
        validate_base64_characters, validate_base64_size, validate_host_header,
        validate_hostname, validate_port,
    },
    limits::{
        validate_size, MAX_BASE64_ENCODED_SIZE, MAX_FILENAME_LENGTH, MAX_PACKAGE_NAME_LENGTH,
        MAX_VERSION_LENGTH,
    },
    manifests::{validate_package_name, validate_version},
    paths::validate_filename,
};
