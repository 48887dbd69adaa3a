//! Request executor port (driven/secondary port)
//!
//! Sends a single raw HTTP request and hands back the status and body.
//! The controller uses it for chunk PUTs and the cancelling DELETE against
//! the upload URL.

use std::fmt;
use std::time::Duration;

use crate::domain::UploadError;

/// HTTP methods the upload controller issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Put,
    Delete,
}

impl RequestMethod {
    /// Uppercase method name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to send verbatim
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute target URL
    pub url: String,
    /// HTTP method
    pub method: RequestMethod,
    /// Header name/value pairs, in insertion order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a request with no headers and an empty body
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// First value of a header, compared case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Chunk bodies are tens of megabytes; never dump them into logs.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
    /// Back-off requested through `Retry-After`
    pub retry_after: Option<Duration>,
}

impl HttpResponse {
    /// Creates a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Records the back-off the server asked for
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// True for any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for the statuses that signal a fully created upload (200, 201)
    pub fn is_complete(&self) -> bool {
        self.status == 200 || self.status == 201
    }
}

// ============================================================================
// IRequestExecutor trait
// ============================================================================

/// Port trait for raw HTTP request execution
///
/// Implementations return `Ok` for every response that was received,
/// whatever its status; `Err` is reserved for requests that produced no
/// response at all.
#[async_trait::async_trait]
pub trait IRequestExecutor: Send + Sync {
    /// Sends `request` and returns the response
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, UploadError>;
}
