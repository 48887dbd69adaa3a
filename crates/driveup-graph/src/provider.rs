//! GraphUploadProvider - upload port implementations for Microsoft Graph API
//!
//! Wraps the [`GraphClient`] and delegates to the [`upload`] module to
//! fulfil the [`ISessionNegotiator`] and [`IRequestExecutor`] port contracts.
//!
//! ## Design Notes
//!
//! - One value implements both ports; hand the controller two clones of the
//!   same `Arc`.
//! - Authentication is out of scope here: the client is built with an
//!   access token obtained elsewhere.

use async_trait::async_trait;
use tracing::debug;

use driveup_core::domain::{ParentFolder, RemoteFile, UploadError, UploadSession, UploadUrl};
use driveup_core::ports::{HttpRequest, HttpResponse, IRequestExecutor, ISessionNegotiator};

use crate::client::GraphClient;
use crate::upload;

/// Upload provider that delegates to the Microsoft Graph API
#[derive(Debug, Clone)]
pub struct GraphUploadProvider {
    client: GraphClient,
}

impl GraphUploadProvider {
    /// Creates a new `GraphUploadProvider` wrapping the given [`GraphClient`]
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Returns the wrapped client
    pub fn client(&self) -> &GraphClient {
        &self.client
    }
}

#[async_trait]
impl ISessionNegotiator for GraphUploadProvider {
    async fn open_session(
        &self,
        folder: &ParentFolder,
        file_name: &str,
    ) -> Result<UploadSession, UploadError> {
        debug!(folder = %folder, file_name, "GraphUploadProvider::open_session");
        upload::create_upload_session(&self.client, folder, file_name).await
    }

    async fn query_status(&self, upload_url: &UploadUrl) -> Result<UploadSession, UploadError> {
        debug!("GraphUploadProvider::query_status");
        upload::get_session_status(&self.client, upload_url).await
    }

    async fn find_file(&self, path: &str) -> Result<Option<RemoteFile>, UploadError> {
        debug!(path, "GraphUploadProvider::find_file");
        upload::get_item_by_path(&self.client, path).await
    }
}

#[async_trait]
impl IRequestExecutor for GraphUploadProvider {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, UploadError> {
        upload::send_to_upload_url(&self.client, request).await
    }
}
