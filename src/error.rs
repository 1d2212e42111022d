//! Error types for VisMatch.
//!
//! VisMatch uses a hierarchical error system:
//! - `VisMatchError` is the top-level error returned by all public APIs
//! - Specific error types (`ValidationError`, `NetworkError`, `ServiceError`)
//!   provide detail
//!
//! No error is fatal to a [`SearchSession`](crate::SearchSession): every
//! failure leaves the session in a settled, re-submittable state.
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use vismatch::{Result, SearchSession};
//!
//! async fn example(session: &SearchSession) -> Result<()> {
//!     session.set_url("https://example.com/shirt.jpg");
//!     session.submit().await?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias for VisMatch operations.
pub type Result<T> = std::result::Result<T, VisMatchError>;

/// Top-level error enum for all VisMatch operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching to handle specific error cases.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VisMatchError {
    /// Input validation error. Raised locally, nothing is dispatched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The request never produced a usable response.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The matching service answered, but not with a result set.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// Local I/O error (reading an image from disk).
    #[error("I/O error: {0}")]
    Io(String),
}

impl VisMatchError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a network error.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns true if this is a service error.
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// Returns true if the request deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(NetworkError::Timeout { .. }))
    }
}

impl From<std::io::Error> for VisMatchError {
    fn from(err: std::io::Error) -> Self {
        VisMatchError::Io(err.to_string())
    }
}

/// Validation errors for caller-provided input.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Submit attempted with neither a file nor a URL selected.
    #[error("No query input: select an image file or enter an image URL")]
    NoQueryInput,

    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// Content exceeds maximum allowed size.
    #[error("Content too large: {size} bytes (max: {max} bytes)")]
    ContentTooLarge {
        /// Actual content size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// A required field is missing or empty.
    #[error("Required field missing: {field}")]
    RequiredField {
        /// Name of the missing field.
        field: String,
    },
}

impl ValidationError {
    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a content too large error.
    pub fn content_too_large(size: usize, max: usize) -> Self {
        Self::ContentTooLarge { size, max }
    }

    /// Creates a required field error.
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }
}

/// Transport-level failures talking to the matching service.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NetworkError {
    /// Could not connect or the connection dropped.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The request deadline elapsed before a response arrived.
    #[error("Request timed out after {millis} ms")]
    Timeout {
        /// Deadline that elapsed, in milliseconds.
        millis: u64,
    },

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl NetworkError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a timeout error for the given deadline.
    pub fn timeout(deadline: std::time::Duration) -> Self {
        Self::Timeout {
            millis: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates a body read error with the given message.
    pub fn body(msg: impl Into<String>) -> Self {
        Self::Body(msg.into())
    }
}

/// Errors reported by (or about the answer of) the matching service.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ServiceError {
    /// Non-success HTTP status.
    #[error("Matching service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Response payload did not decode as a result set.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Any other service-side failure.
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Creates a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a malformed response error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Creates a generic service error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<serde_json::Error> for VisMatchError {
    fn from(err: serde_json::Error) -> Self {
        VisMatchError::Service(ServiceError::malformed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = VisMatchError::config("backend_url is empty");
        assert_eq!(err.to_string(), "Configuration error: backend_url is empty");
    }

    #[test]
    fn test_no_query_input_display() {
        let err: VisMatchError = ValidationError::NoQueryInput.into();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Validation error: No query input"));
    }

    #[test]
    fn test_timeout_display() {
        let err: VisMatchError = NetworkError::timeout(Duration::from_secs(2)).into();
        assert_eq!(
            err.to_string(),
            "Network error: Request timed out after 2000 ms"
        );
        assert!(err.is_timeout());
        assert!(err.is_network());
        assert!(!err.is_service());
    }

    #[test]
    fn test_timeout_saturates_huge_deadline() {
        let err = NetworkError::timeout(std::time::Duration::MAX);
        assert_eq!(err, NetworkError::Timeout { millis: u64::MAX });
    }

    #[test]
    fn test_service_status_display() {
        let err = ServiceError::status(502, "bad gateway");
        assert_eq!(
            err.to_string(),
            "Matching service returned 502: bad gateway"
        );
    }

    #[test]
    fn test_is_service() {
        let err: VisMatchError = ServiceError::malformed("missing field").into();
        assert!(err.is_service());
        assert!(!err.is_validation());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_json_error_converts_to_malformed_response() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{nope");
        let err: VisMatchError = parse.unwrap_err().into();
        assert!(matches!(
            err,
            VisMatchError::Service(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_error_conversion_chain() {
        fn inner() -> Result<()> {
            Err(NetworkError::connection("refused"))?
        }

        let result = inner();
        assert!(result.unwrap_err().is_network());
    }
}
