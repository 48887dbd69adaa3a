//! Microsoft Graph API client
//!
//! Provides a typed HTTP client for interacting with the Microsoft Graph API.
//! Handles authentication headers, endpoint construction and mapping of
//! error statuses to [`GraphError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use driveup_graph::client::GraphClient;
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), driveup_graph::GraphError> {
//! let client = GraphClient::new("access-token-here");
//! let url = client.endpoint(&["me", "drive"])?;
//! let response = client.request(Method::GET, url).send().await?;
//! let body = GraphClient::read_success(response).await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::warn;
use url::Url;

use crate::GraphError;

/// Base URL for Microsoft Graph API v1.0
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default retry-after duration when header is missing (30 seconds)
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

// ============================================================================
// GraphClient
// ============================================================================

/// HTTP client for Microsoft Graph API calls
///
/// Wraps `reqwest::Client` with authentication headers and base URL
/// construction for the Microsoft Graph API. Upload URLs handed out by
/// upload sessions are pre-authenticated; use [`GraphClient::raw`] for
/// those so no bearer token is attached.
#[derive(Debug, Clone)]
pub struct GraphClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Current OAuth2 access token
    access_token: String,
}

impl GraphClient {
    /// Creates a new GraphClient with the given access token
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token for Microsoft Graph
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, GRAPH_BASE_URL)
    }

    /// Creates a new GraphClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an absolute endpoint URL from path segments
    ///
    /// Each segment is percent-encoded on its own, so file names containing
    /// `/`, `#` or `?` stay inside their segment.
    ///
    /// # Errors
    /// [`GraphError::InvalidRequest`] if the base URL cannot carry a path
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, GraphError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            GraphError::InvalidRequest(format!("invalid base URL {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GraphError::InvalidRequest(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Creates an authenticated request builder for the given method and URL
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Creates a request builder with no Authorization header
    ///
    /// For pre-authenticated upload session URLs.
    pub fn raw(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Returns the body of a successful response, or the matching [`GraphError`]
    pub async fn read_success(response: Response) -> Result<String, GraphError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }
        Err(Self::error_for(response).await)
    }

    /// Converts a non-success response into a [`GraphError`], keeping the body
    pub async fn error_for(response: Response) -> GraphError {
        let status = response.status();
        let retry_after = retry_after_for(status, response.headers()).unwrap_or(DEFAULT_RETRY_AFTER);
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_string());

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                retry_after_ms = retry_after.as_millis() as u64,
                "Graph API throttled the request"
            );
        }
        GraphError::from_status(status.as_u16(), body, retry_after)
    }
}

/// Back-off requested by a response
///
/// A 429 without the header still gets the default wait; other statuses
/// only back off when the header is present.
pub fn retry_after_for(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    let header = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER));
    match header {
        Some(delay) => Some(delay),
        None if status == StatusCode::TOO_MANY_REQUESTS => Some(DEFAULT_RETRY_AFTER),
        None => None,
    }
}

/// Parses a `Retry-After` header value
///
/// Accepts integer seconds (what Graph sends) or an HTTP date; anything
/// else, or a date more than an hour away, falls back to `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            if let Some(secs) = (target - now)
                .num_seconds()
                .try_into()
                .ok()
                .filter(|&s: &u64| s <= 3600)
            {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
