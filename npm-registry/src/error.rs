//! # Error Handling and Response Types
//!
//! Every handler returns [`AppResult`]. Failures are classified into an
//! [`ErrorCode`] which decides both the HTTP status and the machine-readable
//! `code` field of the JSON body:
//!
//! ```json
//! {
//!   "error": "Package not found: left-pad",
//!   "code": "not_found",
//!   "timestamp": "2024-01-01T12:00:00Z"
//! }
//! ```
//!
//! - **Validation errors** (400): malformed publish payloads, bad names
//! - **Not found** (404): missing packages or tarballs
//! - **Payload too large** (413): tarballs over the configured limit
//! - **Internal errors** (500): filesystem and persistence failures
//!
//! Internal errors never echo their underlying cause to the client. The cause
//! is logged and the body carries a fixed message instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use crate::validation::ValidationError;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// JSON body returned for every failed request
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: String,
    pub timestamp: String,
}

/// Machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    PayloadTooLarge,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::PayloadTooLarge => "payload_too_large",
            ErrorCode::InternalError => "internal_error",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Metadata for package '{package}' is corrupt: {source}")]
    CorruptMetadata {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::Json(_)
            | AppError::Base64(_)
            | AppError::Validation(_)
            | AppError::BadRequest(_) => ErrorCode::ValidationError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            AppError::Io(_) | AppError::CorruptMetadata { .. } | AppError::InternalError(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Message that is safe to hand to a client.
    pub fn public_message(&self) -> String {
        match self.error_code() {
            ErrorCode::InternalError => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    pub fn to_error_response(&self) -> ApiErrorResponse {
        ApiErrorResponse {
            error: self.public_message(),
            code: self.error_code().as_str().to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let status = code.http_status();

        if code == ErrorCode::InternalError {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, code = code.as_str(), "Request rejected");
        }

        tracing::debug!(status = %status, code = code.as_str(), "Returning error response");
        (status, axum::Json(self.to_error_response())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
