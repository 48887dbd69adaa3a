//! Domain entities and business logic
//!
//! This module contains the core domain types for driveup:
//! - Newtypes for upload URLs and destination folders
//! - The server-authoritative upload session
//! - Chunk sizing and byte-range arithmetic
//! - The transfer state machine
//! - The remote file descriptor returned by a finished upload
//! - Domain-specific error types

pub mod chunk;
pub mod errors;
pub mod newtypes;
pub mod remote_file;
pub mod session;
pub mod transfer;

// Re-export commonly used types
pub use chunk::{ChunkRange, CHUNK_ALIGNMENT, DEFAULT_CHUNK_MULTIPLE, DEFAULT_CHUNK_SIZE};
pub use errors::{DomainError, UploadError};
pub use newtypes::*;
pub use remote_file::RemoteFile;
pub use session::UploadSession;
pub use transfer::{TransferState, UploadProgress};
