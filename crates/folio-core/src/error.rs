//! Error types for Folio operations.
//!
//! A single `Error` type and `Result<T>` alias are used across all Folio
//! crates. Variants follow the propagation policy of the feedback loop:
//!
//! - [`Error::Validation`] and [`Error::NotFound`] are always surfaced verbatim.
//! - [`Error::Embedding`] is swallowed on best-effort paths and surfaced only
//!   by callers that explicitly ask for a vector.
//! - [`Error::RevisionFailed`] aborts a re-analysis with nothing written.
//! - [`Error::ConcurrencyConflict`] is retried once by the writer, then surfaced.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed error source carried by provider failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in Folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was empty or a value was out of range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique (identity, number) pair was already taken at write time.
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The embedding gateway could not produce a vector.
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// An LLM provider call failed.
    #[error("LLM error: {message}")]
    Llm {
        /// Human-readable description.
        message: String,
        /// Whether a retry may succeed (timeouts, rate limits, 5xx).
        retryable: bool,
        /// Underlying cause, when available.
        #[source]
        source: Option<BoxError>,
    },

    /// The external re-analysis step failed; the transition was aborted.
    #[error("Revision failed: {0}")]
    RevisionFailed(String),

    /// A required external service has no credentials.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {}: {source}", .path.display())]
    IoWithPath {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure inside a backend operation.
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Distinguishable embedding failures.
///
/// Every caller of the embedding gateway treats these as "skip the vector,
/// keep the source record"; the variants exist so logs and status reports can
/// tell a timeout from a provider rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// Input was empty after trimming.
    #[error("input text is empty")]
    EmptyInput,

    /// No credentials; no network call was made.
    #[error("embedding provider is not configured")]
    NotConfigured,

    /// The provider did not answer within the configured bound.
    #[error("embedding request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The provider answered with an error or an unusable body.
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// The provider returned a vector of the wrong length.
    #[error("expected a {expected}-dimensional vector, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Returned dimension.
        actual: usize,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a concurrency conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    /// Create a non-retryable LLM error.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm {
            message: msg.into(),
            retryable: false,
            source: None,
        }
    }

    /// Create a retryable LLM error.
    pub fn llm_retryable(msg: impl Into<String>) -> Self {
        Self::Llm {
            message: msg.into(),
            retryable: true,
            source: None,
        }
    }

    /// Create an LLM error with an underlying cause.
    ///
    /// Transport-level causes are assumed retryable.
    pub fn llm_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Llm {
            message: msg.into(),
            retryable: true,
            source: Some(Box::new(source)),
        }
    }

    /// Create a revision failure.
    pub fn revision_failed(msg: impl Into<String>) -> Self {
        Self::RevisionFailed(msg.into())
    }

    /// Create a not configured error.
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Llm { retryable, .. } => *retryable,
            Self::Embedding(EmbeddingError::Timeout { .. }) => true,
            Self::ConcurrencyConflict(_) => true,
            _ => false,
        }
    }

    /// Whether this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this is a concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Folio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_map_to_variants() {
        assert!(matches!(Error::validation("x"), Error::Validation(_)));
        assert!(Error::not_found("critique abc").is_not_found());
        assert!(Error::conflict("dup").is_conflict());
        assert!(matches!(Error::revision_failed("x"), Error::RevisionFailed(_)));
        assert!(matches!(Error::not_configured("x"), Error::NotConfigured(_)));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::llm_retryable("429").is_retryable());
        assert!(!Error::llm("bad request").is_retryable());
        assert!(Error::from(EmbeddingError::Timeout { timeout_ms: 10 }).is_retryable());
        assert!(!Error::from(EmbeddingError::Provider("401".into())).is_retryable());
        assert!(!Error::validation("empty").is_retryable());
    }

    #[test]
    fn test_llm_with_source_keeps_cause() {
        let io = std::io::Error::other("socket closed");
        let err = Error::llm_with_source("calling chat", io);
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::validation("comment must not be empty").to_string(),
            "Validation error: comment must not be empty"
        );
        assert_eq!(
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
            .to_string(),
            "expected a 3-dimensional vector, got 2"
        );
    }

    #[test]
    fn test_serde_json_conversion() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_io_with_path_display() {
        let err = Error::io_with_path(std::io::Error::other("denied"), "/tmp/x.json");
        assert!(err.to_string().contains("/tmp/x.json"));
    }
}
