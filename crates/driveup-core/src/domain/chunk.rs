//! Chunk sizing and byte-range arithmetic
//!
//! Upload session chunks must be a multiple of 320 KiB; only the final
//! chunk of a file may be shorter.

use super::errors::DomainError;

/// Alignment required by OneDrive for every non-final chunk: 320 KiB
pub const CHUNK_ALIGNMENT: u64 = 320 * 1024;

/// Default number of [`CHUNK_ALIGNMENT`] units per chunk
pub const DEFAULT_CHUNK_MULTIPLE: u64 = 100;

/// Default chunk size: 320 KiB * 100 = 32,768,000 bytes
pub const DEFAULT_CHUNK_SIZE: u64 = CHUNK_ALIGNMENT * DEFAULT_CHUNK_MULTIPLE;

/// Inclusive byte range `[start, end]` of a file of length `total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    start: u64,
    end: u64,
    total: u64,
}

impl ChunkRange {
    /// Creates a range, validating `start <= end < total`
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidRange`] for an empty or out-of-bounds range
    pub fn new(start: u64, end: u64, total: u64) -> Result<Self, DomainError> {
        if start > end || end >= total {
            return Err(DomainError::InvalidRange(format!(
                "bytes {start}-{end}/{total}"
            )));
        }
        Ok(Self { start, end, total })
    }

    /// Computes the next chunk to send when the cursor is at `cursor`
    ///
    /// Returns `None` when nothing remains to be sent.
    pub fn next(cursor: u64, total: u64, chunk_size: u64) -> Option<Self> {
        if cursor >= total || chunk_size == 0 {
            return None;
        }
        let len = chunk_size.min(total - cursor);
        Self::new(cursor, cursor + len - 1, total).ok()
    }

    /// First byte of the range
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte of the range (inclusive)
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Length of the whole file
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of bytes in the range
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A valid range always holds at least one byte
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if this range ends at the last byte of the file
    pub fn is_final(&self) -> bool {
        self.end + 1 == self.total
    }

    /// Value for the `Content-Range` header
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }

    /// Value for the `Content-Length` header
    pub fn content_length(&self) -> String {
        self.len().to_string()
    }
}

/// Chunk size for a given multiple of [`CHUNK_ALIGNMENT`]
pub fn chunk_size_for_multiple(multiple: u64) -> u64 {
    CHUNK_ALIGNMENT * multiple
}
