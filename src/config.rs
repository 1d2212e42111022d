//! Configuration types for VisMatch.
//!
//! The [`Config`] struct controls how a session talks to the matching service:
//! - Backend base URL (used by the HTTP adapter)
//! - Request deadline
//! - Upload size limit
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use vismatch::Config;
//!
//! // Use defaults (localhost backend, 30 s deadline)
//! let config = Config::default();
//!
//! // Customize for production
//! let config = Config {
//!     backend_url: "https://match.example.com".to_string(),
//!     request_timeout: Some(Duration::from_secs(10)),
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Environment variable holding the backend base URL.
pub const ENV_BACKEND_URL: &str = "VISMATCH_BACKEND_URL";

/// Environment variable holding the request deadline in whole seconds (`0` disables it).
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "VISMATCH_REQUEST_TIMEOUT_SECS";

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Session configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use vismatch::Config;
///
/// let config = Config {
///     max_upload_bytes: 2 * 1024 * 1024,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the matching service, without trailing `/api/...` path.
    pub backend_url: String,

    /// Deadline for a single search request.
    ///
    /// `None` waits indefinitely; the session then stays `InFlight` until the
    /// service answers or [`cancel`](crate::SearchSession::cancel) is called.
    /// Default: 30 seconds
    pub request_timeout: Option<Duration>,

    /// Largest image file accepted for upload, in bytes.
    ///
    /// Default: 10 MiB
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Config pointing at the given backend.
    ///
    /// # Example
    /// ```rust
    /// use vismatch::Config;
    ///
    /// let config = Config::with_backend_url("https://match.example.com/");
    /// assert_eq!(config.backend_url, "https://match.example.com");
    /// ```
    pub fn with_backend_url(url: impl Into<String>) -> Self {
        Self {
            backend_url: url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Builds a Config from the process environment.
    ///
    /// Reads [`ENV_BACKEND_URL`] and [`ENV_REQUEST_TIMEOUT_SECS`]; unset
    /// variables keep their defaults.
    ///
    /// # Errors
    /// Returns `ValidationError` if the timeout variable is not an integer.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ValidationError> {
        let mut config = match lookup(ENV_BACKEND_URL) {
            Some(url) => Self::with_backend_url(url),
            None => Self::default(),
        };

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ValidationError::invalid_field(
                    ENV_REQUEST_TIMEOUT_SECS,
                    format!("expected whole seconds, got '{}'", raw),
                )
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `SearchSession::new()`.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - `backend_url` is empty or not `http://`/`https://`
    /// - `request_timeout` is zero
    /// - `max_upload_bytes` is 0
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend_url.is_empty() {
            return Err(ValidationError::required_field("backend_url"));
        }

        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://"))
        {
            return Err(ValidationError::invalid_field(
                "backend_url",
                "must start with http:// or https://",
            ));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ValidationError::invalid_field(
                "request_timeout",
                "must be greater than 0 (use None to disable)",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ValidationError::invalid_field(
                "max_upload_bytes",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Joins an API path onto the backend base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), path)
    }
}
