// src/error.rs

//! Unified error handling for the airdrop watcher.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Outcome class of a single failed fetch attempt.
///
/// These never leave the fetcher on their own; once the attempt budget is
/// spent the last one is wrapped in [`AppError::RetriesExhausted`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, TLS or timeout failure before a status was received
    #[error("transport failure: {0}")]
    Transport(String),

    /// HTTP 403, the upstream is actively blocking us
    #[error("blocked by upstream (HTTP 403)")]
    Blocked,

    /// Any other non-2xx status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Response body could not be read to completion
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Body was read but is not the expected JSON document
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether this failure should use the longer cool-down.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request could not be sent
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Every attempt against an endpoint failed
    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: FetchError,
    },

    /// Price lookup failed; callers substitute zero
    #[error("Price unavailable for {token}: {reason}")]
    PriceUnavailable { token: String, reason: String },

    /// Snapshot file could not be read or written
    #[error("Snapshot persistence failed for {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Push delivery failed
    #[error("Notify error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a price lookup error.
    pub fn price_unavailable(token: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::PriceUnavailable {
            token: token.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a persistence error for the given file.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Create a notify error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// True when the error means "the upstream could not be reached",
    /// as opposed to "the upstream answered with nothing".
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_classification() {
        assert!(FetchError::Blocked.is_blocked());
        assert!(!FetchError::Status(500).is_blocked());
        assert!(!FetchError::Decode("eof".into()).is_blocked());
    }

    #[test]
    fn test_exhausted_message_includes_last_failure() {
        let err = AppError::RetriesExhausted {
            url: "https://example.com/api/data".into(),
            attempts: 3,
            last: FetchError::Status(502),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("502"));
        assert!(err.is_fetch_failure());
    }
}
