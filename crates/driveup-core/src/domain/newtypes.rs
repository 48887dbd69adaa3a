//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the identifiers an upload works with.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// UploadUrl
// ============================================================================

/// Server-assigned upload session endpoint
///
/// Opaque to the client: it is only ever used as the target of status
/// queries, chunk PUTs and the cancelling DELETE. The URL carries its own
/// authorization, so no bearer token is attached to requests against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UploadUrl(String);

impl UploadUrl {
    /// Create a new UploadUrl
    ///
    /// # Errors
    /// Returns error if the URL is empty or not http(s)
    pub fn new(url: String) -> Result<Self, DomainError> {
        if url.trim().is_empty() {
            return Err(DomainError::InvalidUploadUrl(
                "Upload URL cannot be empty".to_string(),
            ));
        }

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(DomainError::InvalidUploadUrl(format!(
                "Upload URL must be http(s): {url}"
            )));
        }

        Ok(Self(url))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UploadUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UploadUrl {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for UploadUrl {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UploadUrl> for String {
    fn from(url: UploadUrl) -> Self {
        url.0
    }
}

// ============================================================================
// ParentFolder
// ============================================================================

/// Destination folder reference
///
/// The `id` addresses the folder when opening an upload session; the
/// `name` composes the `"<folder>/<file>"` path used by the duplicate
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentFolder {
    id: String,
    name: String,
}

impl ParentFolder {
    /// Create a new ParentFolder
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains characters OneDrive
    /// never emits in item IDs
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Folder ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '!' || c == '-' || c == '_')
        {
            return Err(DomainError::ValidationFailed(format!(
                "Folder ID contains invalid characters: {id}"
            )));
        }

        Ok(Self {
            id,
            name: name.into().trim_matches('/').to_string(),
        })
    }

    /// Folder item ID
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Folder name, without leading or trailing slashes
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of `file_name` inside this folder, as used by the duplicate lookup
    #[must_use]
    pub fn child_path(&self, file_name: &str) -> String {
        if self.name.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.name, file_name)
        }
    }
}

impl Display for ParentFolder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
