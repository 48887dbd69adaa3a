//! driveup Graph - Microsoft Graph adapter for resumable uploads
//!
//! Provides the async adapter behind the core upload ports:
//! - Upload session creation and status queries
//! - Item-by-path lookup for the duplicate check
//! - Raw request execution against pre-authenticated upload URLs
//!
//! ## Modules
//!
//! - [`client`] - Microsoft Graph API HTTP client
//! - [`upload`] - Upload session endpoints and DriveItem lookup
//! - [`provider`] - Port implementations over [`client::GraphClient`]

pub mod client;
pub mod provider;
pub mod upload;

use std::time::Duration;

use driveup_core::domain::UploadError;
use thiserror::Error;

/// Errors that can occur when communicating with the Microsoft Graph API
#[derive(Debug, Error)]
pub enum GraphError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conflict was detected (e.g., concurrent modification)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {body}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Any other non-success status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A request URL could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GraphError {
    /// Maps a non-success status and its body to the matching variant
    pub fn from_status(status: u16, body: impl Into<String>, retry_after: Duration) -> Self {
        let body = body.into();
        match status {
            401 => GraphError::Unauthorized(body),
            403 => GraphError::Forbidden(body),
            404 => GraphError::NotFound(body),
            409 => GraphError::Conflict(body),
            429 => GraphError::TooManyRequests { retry_after },
            500..=599 => GraphError::ServerError { status, body },
            _ => GraphError::UnexpectedStatus { status, body },
        }
    }

    /// HTTP status behind this error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Unauthorized(_) => Some(401),
            GraphError::Forbidden(_) => Some(403),
            GraphError::NotFound(_) => Some(404),
            GraphError::Conflict(_) => Some(409),
            GraphError::TooManyRequests { .. } => Some(429),
            GraphError::ServerError { status, .. } | GraphError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            GraphError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            GraphError::InvalidRequest(_) | GraphError::InvalidResponse(_) => None,
        }
    }
}

impl From<GraphError> for UploadError {
    fn from(err: GraphError) -> Self {
        let status = err.status();
        match err {
            GraphError::NetworkError(e) => UploadError::Transport(e.to_string()),
            GraphError::InvalidResponse(msg) => UploadError::MalformedResponse(msg),
            GraphError::InvalidRequest(msg) => UploadError::InvalidInput(msg),
            GraphError::Unauthorized(body)
            | GraphError::Forbidden(body)
            | GraphError::NotFound(body)
            | GraphError::Conflict(body)
            | GraphError::ServerError { body, .. }
            | GraphError::UnexpectedStatus { body, .. } => {
                UploadError::RemoteSession { status, body }
            }
            GraphError::TooManyRequests { retry_after } => UploadError::Throttled {
                status: 429,
                retry_after,
                body: "too many requests".to_string(),
            },
        }
    }
}
