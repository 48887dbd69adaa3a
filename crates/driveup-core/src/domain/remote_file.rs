//! Remote file descriptor
//!
//! The minimal shape of a OneDrive DriveItem needed to confirm a finished
//! upload or detect an identical file already present remotely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::UploadError;

/// DriveItem fields read from Graph responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDriveItem {
    /// OneDrive item ID
    id: String,
    /// Item name
    name: String,
    /// File size in bytes
    size: Option<u64>,
    /// Browser URL of the item
    web_url: Option<String>,
    /// Last modified timestamp
    last_modified_date_time: Option<DateTime<Utc>>,
    /// Present if the item is a folder
    folder: Option<serde_json::Value>,
}

/// A file that exists on the remote side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-specific item identifier
    pub id: String,
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Browser URL, when the provider returns one
    pub web_url: Option<String>,
    /// Last modified timestamp
    pub last_modified: Option<DateTime<Utc>>,
}

impl RemoteFile {
    /// Parses a DriveItem JSON body
    ///
    /// # Errors
    /// Returns [`UploadError::MalformedResponse`] if the body is not a
    /// DriveItem or describes a folder.
    pub fn from_json(body: &str) -> Result<Self, UploadError> {
        let item: GraphDriveItem = serde_json::from_str(body)
            .map_err(|e| UploadError::MalformedResponse(format!("drive item: {e}")))?;

        if item.folder.is_some() {
            return Err(UploadError::MalformedResponse(format!(
                "item '{}' is a folder",
                item.name
            )));
        }

        Ok(Self {
            id: item.id,
            name: item.name,
            size: item.size.unwrap_or(0),
            web_url: item.web_url,
            last_modified: item.last_modified_date_time,
        })
    }
}
