//! Use cases (interactors) for driveup
//!
//! Use cases orchestrate domain entities and port interfaces. They are thin
//! coordinators: byte-range arithmetic and state rules live in the domain,
//! network I/O lives behind the ports.
//!
//! ## Use Cases
//!
//! - [`ResumableUpload`] - Chunked, resumable upload of one local file
//! - [`TransferGate`] - Run/pause/cancel gate the upload loop parks on

pub mod resumable_upload;
pub mod transfer_gate;

pub use resumable_upload::{ResumableUpload, UploadOptions, UploadTarget, DEFAULT_MAX_RETRIES};
pub use transfer_gate::TransferGate;
