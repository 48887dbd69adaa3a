//! Tests for the upload session endpoints, through the port traits

use std::time::Duration;

use driveup_core::domain::{UploadError, UploadUrl};
use driveup_core::ports::{HttpRequest, IRequestExecutor, ISessionNegotiator, RequestMethod};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, FILE_NAME, SESSION_PATH};

#[tokio::test]
async fn test_open_session_sends_replace_and_parses_url() {
    let (server, provider) = common::setup_upload_mock().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/me/drive/items/{}:/{FILE_NAME}:/createUploadSession",
            common::FOLDER_ID
        )))
        .and(body_json(serde_json::json!({
            "item": { "@microsoft.graph.conflictBehavior": "replace" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uploadUrl": common::upload_url(&server),
            "expirationDateTime": "2099-01-01T00:00:00Z",
            "nextExpectedRanges": ["0-"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = provider
        .open_session(&common::folder(), FILE_NAME)
        .await
        .unwrap();

    assert_eq!(session.upload_url().as_str(), common::upload_url(&server));
    assert_eq!(session.next_offset(), 0);
    assert!(session.expires_at().is_some());
}

#[tokio::test]
async fn test_open_session_without_url_is_malformed() {
    let (server, provider) = common::setup_upload_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextExpectedRanges": ["0-"]
        })))
        .mount(&server)
        .await;

    let err = provider
        .open_session(&common::folder(), FILE_NAME)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_query_status_keeps_upload_url() {
    let (server, provider) = common::setup_upload_mock().await;
    common::status_mock(4096).mount(&server).await;

    let url = UploadUrl::new(common::upload_url(&server)).unwrap();
    let session = provider.query_status(&url).await.unwrap();

    assert_eq!(session.upload_url(), &url);
    assert_eq!(session.next_offset(), 4096);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_query_status_error_carries_body() {
    let (server, provider) = common::setup_upload_mock().await;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("itemNotFound"))
        .mount(&server)
        .await;

    let url = UploadUrl::new(common::upload_url(&server)).unwrap();
    let err = provider.query_status(&url).await.unwrap_err();

    assert!(matches!(
        err,
        UploadError::RemoteSession { status: Some(404), ref body } if body == "itemNotFound"
    ));
}

#[tokio::test]
async fn test_find_file_distinguishes_missing_from_failure() {
    let (server, provider) = common::setup_upload_mock().await;
    common::mount_lookup_not_found(&server).await;
    let path_str = format!("{}/{FILE_NAME}", common::FOLDER_NAME);

    assert!(provider.find_file(&path_str).await.unwrap().is_none());

    server.reset().await;
    common::mount_lookup_found(&server, "FOUND", 77).await;
    let found = provider.find_file(&path_str).await.unwrap().unwrap();
    assert_eq!(found.id, "FOUND");
    assert_eq!(found.size, 77);

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
        .mount(&server)
        .await;
    let err = provider.find_file(&path_str).await.unwrap_err();
    assert!(matches!(err, UploadError::RemoteSession { status: Some(401), .. }));
}

#[tokio::test]
async fn test_execute_returns_error_statuses_as_responses() {
    let (server, provider) = common::setup_upload_mock().await;
    common::chunk_mock(
        "bytes 0-2/10",
        ResponseTemplate::new(416).set_body_string("invalidRange"),
    )
    .mount(&server)
    .await;

    let request = HttpRequest::new(RequestMethod::Put, common::upload_url(&server))
        .header("Content-Length", "3")
        .header("Content-Range", "bytes 0-2/10")
        .body(vec![1, 2, 3]);
    let response = provider.execute(request).await.unwrap();

    assert_eq!(response.status, 416);
    assert_eq!(response.body, "invalidRange");
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_execute_reports_retry_after_on_throttled_chunk() {
    let (server, provider) = common::setup_upload_mock().await;
    common::chunk_mock(
        "bytes 0-2/10",
        ResponseTemplate::new(429)
            .insert_header("Retry-After", "7")
            .set_body_string("activityLimitReached"),
    )
    .mount(&server)
    .await;

    let request = HttpRequest::new(RequestMethod::Put, common::upload_url(&server))
        .header("Content-Length", "3")
        .header("Content-Range", "bytes 0-2/10")
        .body(vec![1, 2, 3]);
    let response = provider.execute(request).await.unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(response.retry_after, Some(Duration::from_secs(7)));
    assert_eq!(response.body, "activityLimitReached");
}

#[tokio::test]
async fn test_execute_unreachable_host_is_transport_error() {
    let (_server, provider) = common::setup_upload_mock().await;
    let request = HttpRequest::new(RequestMethod::Delete, "http://127.0.0.1:9/upload/gone");

    let err = provider.execute(request).await.unwrap_err();
    assert!(matches!(err, UploadError::Transport(_)));
}
