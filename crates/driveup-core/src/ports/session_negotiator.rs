//! Session negotiator port (driven/secondary port)
//!
//! Opens and queries resumable upload sessions, and answers the advisory
//! "does this file already exist" lookup used to skip duplicate uploads.
//!
//! ## Design Notes
//!
//! - Errors are [`UploadError`] so the controller can tell a non-success
//!   response (`RemoteSession`) from a transport failure (`Transport`).
//! - `find_file` returns `Ok(None)` for "not found"; an `Err` means the
//!   lookup itself failed.

use crate::domain::{ParentFolder, RemoteFile, UploadError, UploadSession, UploadUrl};

// ============================================================================
// ISessionNegotiator trait
// ============================================================================

/// Port trait for upload session negotiation
#[async_trait::async_trait]
pub trait ISessionNegotiator: Send + Sync {
    /// Opens a new upload session for `file_name` inside `folder`
    ///
    /// # Returns
    /// The session with its server-assigned upload URL
    async fn open_session(
        &self,
        folder: &ParentFolder,
        file_name: &str,
    ) -> Result<UploadSession, UploadError>;

    /// Queries the current state of an upload session
    ///
    /// # Errors
    /// [`UploadError::RemoteSession`] carrying the response body when the
    /// server answers with a non-success status
    async fn query_status(&self, upload_url: &UploadUrl) -> Result<UploadSession, UploadError>;

    /// Looks up a file by its path relative to the drive root
    ///
    /// # Arguments
    /// * `path` - `"<folder>/<file>"` path of the item
    ///
    /// # Returns
    /// `Some` with the remote descriptor if the item exists, `None` otherwise
    async fn find_file(&self, path: &str) -> Result<Option<RemoteFile>, UploadError>;
}
