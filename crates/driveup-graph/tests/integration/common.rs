//! Shared test helpers for Graph API integration tests
//!
//! Provides wiremock-based mock server setup for the upload session
//! endpoints. Each helper mounts one endpoint; [`setup_upload_mock`]
//! returns a provider pointing at the mock server.

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use driveup_core::domain::ParentFolder;
use driveup_graph::client::GraphClient;
use driveup_graph::provider::GraphUploadProvider;

pub const FOLDER_ID: &str = "FOLDER001";
pub const FOLDER_NAME: &str = "Documents";
pub const FILE_NAME: &str = "data.bin";
pub const SESSION_PATH: &str = "/upload/session-1";

/// Starts a mock server and returns it with a provider aimed at it
pub async fn setup_upload_mock() -> (MockServer, Arc<GraphUploadProvider>) {
    let server = MockServer::start().await;
    let client = GraphClient::with_base_url("test-access-token", server.uri());
    (server, Arc::new(GraphUploadProvider::new(client)))
}

pub fn folder() -> ParentFolder {
    ParentFolder::new(FOLDER_ID, FOLDER_NAME).unwrap()
}

pub fn upload_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), SESSION_PATH)
}

pub fn drive_item(id: &str, name: &str, size: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "size": size,
        "webUrl": format!("https://onedrive.example.com/{id}"),
        "lastModifiedDateTime": "2026-01-15T10:00:00Z",
        "file": { "mimeType": "application/octet-stream" }
    })
}

/// File whose byte at offset `i` is `i % 251`
pub fn source_file(len: usize) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    tmp.write_all(&data).unwrap();
    tmp.flush().unwrap();
    tmp
}

/// Mounts `POST /me/drive/items/{FOLDER_ID}:/{FILE_NAME}:/createUploadSession`
pub async fn mount_create_session(server: &MockServer) {
    let path_str = format!("/me/drive/items/{FOLDER_ID}:/{FILE_NAME}:/createUploadSession");
    Mock::given(method("POST"))
        .and(path(path_str))
        .and(header("Authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uploadUrl": upload_url(server),
            "expirationDateTime": "2099-01-01T00:00:00Z",
            "nextExpectedRanges": ["0-"]
        })))
        .mount(server)
        .await;
}

/// Mounts the duplicate-check lookup answering 404
pub async fn mount_lookup_not_found(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/me/drive/root:/{FOLDER_NAME}/{FILE_NAME}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": "itemNotFound", "message": "The resource could not be found." }
        })))
        .mount(server)
        .await;
}

/// Mounts the duplicate-check lookup returning an existing file
pub async fn mount_lookup_found(server: &MockServer, id: &str, size: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/me/drive/root:/{FOLDER_NAME}/{FILE_NAME}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(drive_item(id, FILE_NAME, size)))
        .mount(server)
        .await;
}

/// Mounts `GET <uploadUrl>` reporting `next` as the next expected byte
///
/// Returns the mock so callers can set expectations on it.
pub fn status_mock(next: u64) -> Mock {
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "expirationDateTime": "2099-01-01T00:00:00Z",
            "nextExpectedRanges": [format!("{next}-")]
        })))
}

/// Mock for a chunk PUT with the given `Content-Range`
pub fn chunk_mock(content_range: &str, response: ResponseTemplate) -> Mock {
    Mock::given(method("PUT"))
        .and(path(SESSION_PATH))
        .and(header("Content-Range", content_range))
        .respond_with(response)
}

/// 202 response acknowledging a partial upload
pub fn accepted(next: u64) -> ResponseTemplate {
    ResponseTemplate::new(202).set_body_json(serde_json::json!({
        "expirationDateTime": "2099-01-01T00:00:00Z",
        "nextExpectedRanges": [format!("{next}-")]
    }))
}
