//! Common error types for GCDA clients

use thiserror::Error;

/// Common result type for GCDA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error taxonomy across GCDA client components
///
/// Every backend transport error is converted into one of these variants at
/// the API service boundary; raw `reqwest` errors never cross a component
/// boundary. The submission pipeline consults [`Error::is_retryable`] to
/// decide whether an attempt may be repeated.
#[derive(Error, Debug)]
pub enum Error {
    /// Local input validation failure, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or expired credentials; caller should present re-authentication
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Transient backend or network failure; safe to retry
    #[error("Transient error: {0}")]
    Transient(String),

    /// Definitive backend rejection; retrying will not help
    #[error("Request rejected: {0}")]
    Terminal(String),

    /// Response body violated the wire contract
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal client error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether an operation that failed with this error may be retried.
    ///
    /// Only [`Error::Transient`] qualifies. Rate limiting (HTTP 429) is
    /// mapped to [`Error::Terminal`] by the API layer and is therefore
    /// never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}
