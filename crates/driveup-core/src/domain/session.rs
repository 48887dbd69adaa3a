//! UploadSession domain entity
//!
//! An upload session is the server-side resumable-transfer context. The
//! server is authoritative about how many bytes it has durably received,
//! expressed as the start of the first entry in `nextExpectedRanges`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::errors::{DomainError, UploadError};
use super::newtypes::UploadUrl;

/// Upload session descriptor as returned by Microsoft Graph
///
/// `uploadUrl` is only present when the session is created; status
/// queries and partial-chunk acknowledgments omit it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSessionResponse {
    /// The URL to use for uploading chunks
    upload_url: Option<String>,
    /// Ranges the server still needs, e.g. `["26-"]` or `["0-499", "1000-"]`
    #[serde(default)]
    next_expected_ranges: Vec<String>,
    /// When the session expires if no further chunk arrives
    expiration_date_time: Option<DateTime<Utc>>,
}

/// Server-authoritative state of a resumable upload
///
/// Replaced wholesale every time the server reports a new state; never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Upload endpoint for this session
    upload_url: UploadUrl,
    /// Next byte offset the server expects
    next_offset: u64,
    /// Session expiration reported by the server
    expires_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    /// Creates a session descriptor directly
    pub fn new(upload_url: UploadUrl, next_offset: u64) -> Self {
        Self {
            upload_url,
            next_offset,
            expires_at: None,
        }
    }

    /// Parses a session descriptor from a JSON response body
    ///
    /// `fallback_url` is used when the body carries no `uploadUrl`, which
    /// is the case for status queries and partial-chunk acknowledgments.
    ///
    /// # Errors
    /// Returns [`UploadError::MalformedResponse`] if the body is not a
    /// session descriptor or no upload URL can be determined.
    pub fn from_json(body: &str, fallback_url: Option<&UploadUrl>) -> Result<Self, UploadError> {
        let response: UploadSessionResponse = serde_json::from_str(body)
            .map_err(|e| UploadError::MalformedResponse(format!("upload session: {e}")))?;

        let upload_url = match (response.upload_url, fallback_url) {
            (Some(url), _) => UploadUrl::new(url)
                .map_err(|e| UploadError::MalformedResponse(e.to_string()))?,
            (None, Some(url)) => url.clone(),
            (None, None) => {
                return Err(UploadError::MalformedResponse(
                    "upload session has no uploadUrl".to_string(),
                ))
            }
        };

        let next_offset = match response.next_expected_ranges.first() {
            Some(range) => parse_range_start(range)
                .map_err(|e| UploadError::MalformedResponse(e.to_string()))?,
            None => 0,
        };

        Ok(Self {
            upload_url,
            next_offset,
            expires_at: response.expiration_date_time,
        })
    }

    /// Returns the upload URL
    pub fn upload_url(&self) -> &UploadUrl {
        &self.upload_url
    }

    /// Returns the next byte offset the server expects
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Returns the expiration timestamp, if reported
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the server reported an expiration that has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Utc::now() >= t)
    }
}

/// Extracts the start offset of a `"start-end"` or `"start-"` range
fn parse_range_start(range: &str) -> Result<u64, DomainError> {
    let start = range.split('-').next().unwrap_or_default().trim();
    start
        .parse::<u64>()
        .map_err(|_| DomainError::InvalidRange(format!("unparseable range '{range}'")))
}
