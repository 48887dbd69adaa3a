//! Upload session operations for Microsoft Graph API (OneDrive)
//!
//! Provides the calls a resumable upload needs:
//! - [`create_upload_session`] - Opens a session under a parent folder
//! - [`get_session_status`] - Asks a session which bytes it still expects
//! - [`get_item_by_path`] - Looks up an existing file for the duplicate check
//! - [`send_to_upload_url`] - Sends a chunk PUT or cancel DELETE verbatim
//!
//! Upload URLs are pre-authenticated, so requests against them carry no
//! bearer token.
//!
//! ## Microsoft Graph API References
//!
//! - [Upload large files](https://learn.microsoft.com/en-us/graph/api/driveitem-createuploadsession)

use driveup_core::domain::{ParentFolder, RemoteFile, UploadError, UploadSession, UploadUrl};
use driveup_core::ports::{HttpRequest, HttpResponse, RequestMethod};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{retry_after_for, GraphClient};
use crate::GraphError;

/// Conflict behavior requested for new sessions: overwrite an existing item
const CONFLICT_BEHAVIOR: &str = "replace";

// ============================================================================
// Request bodies
// ============================================================================

/// Body of `createUploadSession`
#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    item: SessionItem<'a>,
}

#[derive(Debug, Serialize)]
struct SessionItem<'a> {
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    conflict_behavior: &'a str,
}

// ============================================================================
// API path construction helpers
// ============================================================================

/// Builds `/me/drive/items/{parent-id}:/{name}:/createUploadSession`
pub fn session_endpoint(
    client: &GraphClient,
    folder: &ParentFolder,
    name: &str,
) -> Result<Url, GraphError> {
    let parent = format!("{}:", folder.id());
    let item = format!("{name}:");
    client.endpoint(&["me", "drive", "items", &parent, &item, "createUploadSession"])
}

/// Builds `/me/drive/root:/{path}` for a slash-separated path
pub fn item_by_path_endpoint(client: &GraphClient, path: &str) -> Result<Url, GraphError> {
    let mut segments = vec!["me", "drive", "root:"];
    segments.extend(path.split('/').filter(|s| !s.is_empty()));
    client.endpoint(&segments)
}

fn to_method(method: RequestMethod) -> Method {
    match method {
        RequestMethod::Get => Method::GET,
        RequestMethod::Put => Method::PUT,
        RequestMethod::Delete => Method::DELETE,
    }
}

// ============================================================================
// Session operations
// ============================================================================

/// Creates a resumable upload session for `name` under `folder`
///
/// Uses `POST /me/drive/items/{parent-id}:/{name}:/createUploadSession`
/// with the `replace` conflict behavior.
///
/// # Errors
/// [`UploadError::RemoteSession`] with the response body for a non-success
/// status; [`UploadError::MalformedResponse`] if the body has no upload URL
pub async fn create_upload_session(
    client: &GraphClient,
    folder: &ParentFolder,
    name: &str,
) -> Result<UploadSession, UploadError> {
    let url = session_endpoint(client, folder, name)?;
    debug!(folder = %folder, name, "Creating upload session");

    let body = CreateSessionRequest {
        item: SessionItem {
            conflict_behavior: CONFLICT_BEHAVIOR,
        },
    };
    let response = client
        .request(Method::POST, url)
        .json(&body)
        .send()
        .await
        .map_err(GraphError::from)?;
    let text = GraphClient::read_success(response).await?;

    let session = UploadSession::from_json(&text, None)?;
    info!(
        name,
        expires_at = ?session.expires_at(),
        "Upload session created"
    );
    Ok(session)
}

/// Queries which bytes an upload session still expects
///
/// Uses `GET <uploadUrl>`. The status response carries no upload URL, so
/// the queried one is kept.
pub async fn get_session_status(
    client: &GraphClient,
    upload_url: &UploadUrl,
) -> Result<UploadSession, UploadError> {
    let response = client
        .raw(Method::GET, upload_url.as_str())
        .send()
        .await
        .map_err(GraphError::from)?;
    let text = GraphClient::read_success(response).await?;

    let session = UploadSession::from_json(&text, Some(upload_url))?;
    debug!(next_offset = session.next_offset(), "Upload session status");
    Ok(session)
}

/// Looks up a file by its path below the drive root
///
/// Uses `GET /me/drive/root:/{path}`.
///
/// # Returns
/// `Ok(None)` when the item does not exist
pub async fn get_item_by_path(
    client: &GraphClient,
    path: &str,
) -> Result<Option<RemoteFile>, UploadError> {
    let url = item_by_path_endpoint(client, path)?;
    let response = client
        .request(Method::GET, url)
        .send()
        .await
        .map_err(GraphError::from)?;

    match GraphClient::read_success(response).await {
        Ok(text) => Ok(Some(RemoteFile::from_json(&text)?)),
        Err(GraphError::NotFound(_)) => {
            debug!(path, "No remote item at path");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Sends a request to a pre-authenticated upload URL
///
/// Every answered request is returned as-is, whatever its status; only
/// transport failures are errors.
pub async fn send_to_upload_url(
    client: &GraphClient,
    request: HttpRequest,
) -> Result<HttpResponse, UploadError> {
    debug!(method = %request.method, len = request.body.len(), "Sending upload URL request");

    let mut builder = client.raw(to_method(request.method), &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !request.body.is_empty() {
        builder = builder.body(request.body);
    }

    let response = builder.send().await.map_err(GraphError::from)?;
    let status = response.status();
    let retry_after = if status.is_success() {
        None
    } else {
        retry_after_for(status, response.headers())
    };
    let body = response.text().await.map_err(GraphError::from)?;

    let reply = HttpResponse::new(status.as_u16(), body);
    Ok(match retry_after {
        Some(delay) => {
            warn!(
                status = status.as_u16(),
                retry_after_ms = delay.as_millis() as u64,
                "Upload URL request throttled"
            );
            reply.with_retry_after(delay)
        }
        None => reply,
    })
}

// ============================================================================
// Tests
// ============================================================================
