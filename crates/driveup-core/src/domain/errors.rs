//! Domain error types
//!
//! [`DomainError`] covers validation of domain values and state
//! transitions. [`UploadError`] is the error surfaced by the upload
//! controller and by the port traits it consumes.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Invalid upload URL
    #[error("Invalid upload URL: {0}")]
    InvalidUploadUrl(String),

    /// Invalid byte range
    #[error("Invalid byte range: {0}")]
    InvalidRange(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors produced while negotiating or driving a resumable upload
///
/// Inside the transfer loop every error counts against the retry ceiling.
/// A [`UploadError::Throttled`] error also stretches the wait before the
/// next attempt to what the server asked for.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Bad constructor arguments (missing, non-regular or unreadable file)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote side answered with a non-success status
    #[error("Remote session error (status {status:?}): {body}")]
    RemoteSession {
        /// HTTP status code, when a response was received
        status: Option<u16>,
        /// Response body, kept as diagnostic text
        body: String,
    },

    /// The server asked the client to back off before retrying
    #[error("Throttled (status {status}), retry after {retry_after:?}: {body}")]
    Throttled {
        /// HTTP status code (429 or 503)
        status: u16,
        /// Wait requested through `Retry-After`
        retry_after: Duration,
        /// Response body, kept as diagnostic text
        body: String,
    },

    /// The request never produced a response (connection, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Local file read or seek failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bounded retry counter was exhausted
    #[error("Retry limit exceeded after {attempts} attempts: {last_error}")]
    RetryLimitExceeded {
        /// Number of consecutive failed attempts
        attempts: u32,
        /// Display form of the last recoverable error
        last_error: String,
    },

    /// A domain invariant was violated
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl UploadError {
    /// Wait the server requested before the next attempt, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            UploadError::Throttled { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Convenience constructor for a non-success HTTP response
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        UploadError::RemoteSession {
            status: Some(status),
            body: body.into(),
        }
    }
}
