//! Integration tests for driveup-graph
//!
//! Uses wiremock to simulate the Microsoft Graph API and verifies
//! end-to-end behavior of the upload provider and the resumable upload
//! controller running on top of it.

mod common;

mod test_resumable_upload;
mod test_session_endpoints;
