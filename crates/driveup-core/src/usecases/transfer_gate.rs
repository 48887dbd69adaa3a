//! Cooperative run/pause/cancel gate for a single transfer
//!
//! The gate holds the [`TransferState`] in a `tokio::sync::watch` channel.
//! Control calls (`pause`, `resume`, `cancel`) flip the state from any task
//! and never block; the transfer loop calls [`TransferGate::wait_runnable`]
//! once per iteration and parks there while the state is `Paused`.
//!
//! ```text
//!  controller task ── pause()/resume()/cancel() ──► watch::Sender<TransferState>
//!                                                           │
//!  transfer loop ◄── wait_runnable() (parks while Paused) ──┘
//! ```

use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::{DomainError, TransferState};

/// Binary run/pause gate plus terminal-state flag for one upload
#[derive(Debug)]
pub struct TransferGate {
    state_tx: watch::Sender<TransferState>,
}

impl TransferGate {
    /// Creates a gate in the `Running` state
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(TransferState::Running);
        Self { state_tx }
    }

    /// Current state
    pub fn state(&self) -> TransferState {
        *self.state_tx.borrow()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.state_tx.subscribe()
    }

    /// Applies `target` if legal from the current state
    ///
    /// Returns the previous state on success.
    fn transition(&self, target: TransferState) -> Result<TransferState, DomainError> {
        let mut outcome = Ok(target);
        self.state_tx.send_if_modified(|state| {
            let from = *state;
            match from.transition_to(target) {
                Ok(next) => {
                    *state = next;
                    outcome = Ok(from);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    /// Closes the gate; the loop stops at its next check
    ///
    /// Returns false (and changes nothing) unless the transfer was running.
    pub fn pause(&self) -> bool {
        match self.transition(TransferState::Paused) {
            Ok(_) => {
                info!("Upload paused");
                true
            }
            Err(e) => {
                debug!(error = %e, "Pause ignored");
                false
            }
        }
    }

    /// Reopens the gate
    ///
    /// Returns false (and changes nothing) unless the transfer was paused.
    pub fn resume(&self) -> bool {
        match self.transition(TransferState::Running) {
            Ok(_) => {
                info!("Upload resumed");
                true
            }
            Err(_) => {
                info!(state = %self.state(), "Resume requested for a transfer that is not paused");
                false
            }
        }
    }

    /// Moves to `Canceled`, waking a loop parked at the gate
    ///
    /// Returns true if this call performed the transition; false if the
    /// transfer was already canceled or finished.
    pub fn cancel(&self) -> bool {
        self.transition(TransferState::Canceled).is_ok()
    }

    /// Moves to `Finished`
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidState`] if the transfer already reached
    /// a terminal state (a concurrent cancel won the race)
    pub fn finish(&self) -> Result<(), DomainError> {
        self.transition(TransferState::Finished).map(|_| ())
    }

    /// Parks while the gate is closed and returns the state that released it
    ///
    /// The returned state is `Running`, `Finished` or `Canceled`, never `Paused`.
    pub async fn wait_runnable(&self) -> TransferState {
        let mut rx = self.state_tx.subscribe();
        if *rx.borrow() == TransferState::Paused {
            debug!("Transfer loop waiting at pause gate");
        }
        let released = match rx.wait_for(|s| *s != TransferState::Paused).await {
            Ok(state) => *state,
            // The sender lives in `self`; it cannot be gone while we borrow it.
            Err(_) => TransferState::Canceled,
        };
        released
    }
}

impl Default for TransferGate {
    fn default() -> Self {
        Self::new()
    }
}
