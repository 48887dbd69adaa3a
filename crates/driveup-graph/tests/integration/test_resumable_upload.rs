//! End-to-end tests: ResumableUpload driving GraphUploadProvider
//!
//! Every test runs the real controller against a wiremock Graph API and
//! checks both the outcome and the requests the server saw.

use std::sync::Arc;

use driveup_core::domain::{TransferState, UploadError};
use driveup_core::usecases::{ResumableUpload, UploadOptions};
use driveup_graph::provider::GraphUploadProvider;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, FILE_NAME, SESSION_PATH};

async fn new_upload(
    provider: &Arc<GraphUploadProvider>,
    file: &tempfile::NamedTempFile,
    options: UploadOptions,
) -> ResumableUpload {
    ResumableUpload::new(
        provider.clone(),
        provider.clone(),
        file.path(),
        FILE_NAME,
        common::folder(),
        options,
    )
    .await
    .expect("upload session opened")
}

fn chunked(chunk_size: u64) -> UploadOptions {
    UploadOptions {
        chunk_size,
        ..UploadOptions::default()
    }
}

async fn puts(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .collect()
}

// ============================================================================
// Happy paths
// ============================================================================

#[tokio::test]
async fn test_single_chunk_upload() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    common::mount_lookup_not_found(&server).await;
    common::status_mock(0).expect(1).mount(&server).await;
    common::chunk_mock(
        "bytes 0-999/1000",
        ResponseTemplate::new(201).set_body_json(common::drive_item("ITEM-1", FILE_NAME, 1000)),
    )
    .expect(1)
    .mount(&server)
    .await;

    let file = common::source_file(1000);
    let upload = new_upload(&provider, &file, UploadOptions::default()).await;
    let result = upload.start_upload().await.unwrap().expect("remote file");

    assert_eq!(result.id, "ITEM-1");
    assert_eq!(result.size, 1000);
    assert_eq!(upload.state(), TransferState::Finished);

    let puts = puts(&server).await;
    assert_eq!(puts.len(), 1);
    let put = &puts[0];
    assert!(put.headers.get("authorization").is_none(), "upload URL is pre-authenticated");
    assert_eq!(put.headers.get("content-length").unwrap(), "1000");
    let expected: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
    assert_eq!(put.body, expected);
}

#[tokio::test]
async fn test_multi_chunk_upload_follows_acks() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    common::mount_lookup_not_found(&server).await;
    common::status_mock(0).expect(1).mount(&server).await;
    common::chunk_mock("bytes 0-399/1000", common::accepted(400))
        .expect(1)
        .mount(&server)
        .await;
    common::chunk_mock("bytes 400-799/1000", common::accepted(800))
        .expect(1)
        .mount(&server)
        .await;
    common::chunk_mock(
        "bytes 800-999/1000",
        ResponseTemplate::new(201).set_body_json(common::drive_item("ITEM-2", FILE_NAME, 1000)),
    )
    .expect(1)
    .mount(&server)
    .await;

    let file = common::source_file(1000);
    let upload = new_upload(&provider, &file, chunked(400)).await;
    let progress = upload.subscribe_progress();

    let result = upload.start_upload().await.unwrap().expect("remote file");

    assert_eq!(result.id, "ITEM-2");
    assert_eq!(progress.borrow().bytes_confirmed, 1000);
    assert_eq!(puts(&server).await.len(), 3);
}

#[tokio::test]
async fn test_upload_resumes_at_server_offset() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    common::mount_lookup_not_found(&server).await;
    common::status_mock(600).mount(&server).await;
    common::chunk_mock(
        "bytes 600-999/1000",
        ResponseTemplate::new(201).set_body_json(common::drive_item("ITEM-3", FILE_NAME, 1000)),
    )
    .expect(1)
    .mount(&server)
    .await;

    let file = common::source_file(1000);
    let upload = new_upload(&provider, &file, UploadOptions::default()).await;

    assert_eq!(upload.upload_status().await.unwrap(), 600);
    let result = upload.start_upload().await.unwrap();
    assert!(result.is_some());

    let body = &puts(&server).await[0].body;
    assert_eq!(body.len(), 400);
    assert_eq!(body[0], (600 % 251) as u8);
}

// ============================================================================
// Duplicate detection
// ============================================================================

#[tokio::test]
async fn test_existing_identical_file_skips_upload() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    common::mount_lookup_found(&server, "EXISTING", 1000).await;
    common::status_mock(0).expect(0).mount(&server).await;
    Mock::given(method("PUT"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let file = common::source_file(1000);
    let upload = new_upload(&provider, &file, UploadOptions::default()).await;
    let result = upload.start_upload().await.unwrap().expect("existing file");

    assert_eq!(result.id, "EXISTING");
    assert_eq!(upload.state(), TransferState::Finished);
}

#[tokio::test]
async fn test_failed_lookup_still_uploads() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/me/drive/root:/{}/{FILE_NAME}", common::FOLDER_NAME)))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    common::status_mock(0).mount(&server).await;
    common::chunk_mock(
        "bytes 0-99/100",
        ResponseTemplate::new(200).set_body_json(common::drive_item("ITEM-4", FILE_NAME, 100)),
    )
    .expect(1)
    .mount(&server)
    .await;

    let file = common::source_file(100);
    let upload = new_upload(&provider, &file, UploadOptions::default()).await;

    assert!(upload.start_upload().await.unwrap().is_some());
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    common::mount_lookup_not_found(&server).await;
    common::status_mock(0).mount(&server).await;
    common::chunk_mock(
        "bytes 0-99/100",
        ResponseTemplate::new(500).set_body_string("generalException"),
    )
    .expect(3)
    .mount(&server)
    .await;

    let file = common::source_file(100);
    let options = UploadOptions {
        max_retries: 3,
        ..UploadOptions::default()
    };
    let upload = new_upload(&provider, &file, options).await;

    let err = upload.start_upload().await.unwrap_err();
    assert!(matches!(err, UploadError::RetryLimitExceeded { attempts: 3, .. }));
    assert_eq!(upload.state(), TransferState::Canceled);
}

#[tokio::test]
async fn test_open_session_failure_surfaces() {
    let (server, provider) = common::setup_upload_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("accessDenied"))
        .mount(&server)
        .await;

    let file = common::source_file(100);
    let err = ResumableUpload::new(
        provider.clone(),
        provider.clone(),
        file.path(),
        FILE_NAME,
        common::folder(),
        UploadOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        UploadError::RemoteSession { status: Some(403), ref body } if body == "accessDenied"
    ));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_deletes_session() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    Mock::given(method("DELETE"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let file = common::source_file(100);
    let upload = new_upload(&provider, &file, UploadOptions::default()).await;

    upload.cancel_upload().await.unwrap();
    assert_eq!(upload.state(), TransferState::Canceled);
    assert_eq!(upload.start_upload().await.unwrap(), None);
    assert!(puts(&server).await.is_empty());
}

#[tokio::test]
async fn test_cancel_reports_failed_delete() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_create_session(&server).await;
    Mock::given(method("DELETE"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let file = common::source_file(100);
    let upload = new_upload(&provider, &file, UploadOptions::default()).await;

    let err = upload.cancel_upload().await.unwrap_err();
    assert!(matches!(err, UploadError::RemoteSession { status: Some(500), .. }));
    assert_eq!(upload.state(), TransferState::Canceled);
}
