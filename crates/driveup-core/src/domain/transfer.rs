//! Transfer state machine
//!
//! ```text
//!             pause
//!   Running ◄──────► Paused
//!             resume
//!   Running | Paused ──finish──► Finished
//!   Running | Paused ──cancel──► Canceled
//! ```
//!
//! `Finished` and `Canceled` are terminal. `Paused -> Finished` happens when
//! a pause is requested while the final chunk is already in flight.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Lifecycle state of a single upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Chunks may be sent
    Running,
    /// The loop waits at its next gate check
    Paused,
    /// The remote object exists with the full content
    Finished,
    /// Abandoned by the caller or by retry exhaustion
    Canceled,
}

impl TransferState {
    /// Returns true for `Finished` and `Canceled`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Finished | TransferState::Canceled)
    }

    /// Returns true if the transfer loop may proceed past the gate
    pub fn is_runnable(&self) -> bool {
        matches!(self, TransferState::Running)
    }

    /// Lowercase name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            TransferState::Running => "running",
            TransferState::Paused => "paused",
            TransferState::Finished => "finished",
            TransferState::Canceled => "canceled",
        }
    }

    /// Checks whether `target` is reachable from this state in one step
    pub fn can_transition_to(&self, target: TransferState) -> bool {
        matches!(
            (self, target),
            (TransferState::Running, TransferState::Paused)
                | (TransferState::Running, TransferState::Finished)
                | (TransferState::Running, TransferState::Canceled)
                | (TransferState::Paused, TransferState::Running)
                | (TransferState::Paused, TransferState::Finished)
                | (TransferState::Paused, TransferState::Canceled)
        )
    }

    /// Returns the target state if the transition is legal
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidState`] for an illegal transition
    pub fn transition_to(self, target: TransferState) -> Result<TransferState, DomainError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidState {
                from: self.name().to_string(),
                to: target.name().to_string(),
            })
        }
    }
}

impl Default for TransferState {
    fn default() -> Self {
        TransferState::Running
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Bytes the server has confirmed out of the file total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Next offset the server expects (equivalently, bytes received)
    pub bytes_confirmed: u64,
    /// Source file length
    pub total: u64,
}

impl UploadProgress {
    /// Percentage in 0..=100; an empty file counts as complete
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.bytes_confirmed.min(self.total) * 100) / self.total) as u8
    }
}
