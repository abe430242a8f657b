//! Deferred build failure.
//!
//! A failing verdict is not reported right away: the message is parked in a
//! [`PendingFailure`] and turned into [`BreakerError::BuildBroken`] only when
//! the post-jobs phase reports [`PhaseEvent::End`]. Until then other post jobs
//! (report publishers and the like) keep running on the same issues.
//!
//! | Slot        | Event   | Effect                         |
//! |-------------|---------|--------------------------------|
//! | empty       | any     | nothing                        |
//! | recorded    | `Start` | nothing                        |
//! | recorded    | `End`   | error logged and returned      |

use breaker_core::{PhaseEvent, BUILD_BREAKER_LOG_STAMP};
use tracing::{debug, error};

use crate::BreakerError;

/// Slot holding at most one failure message until the phase ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingFailure {
    message: Option<String>,
}

impl PendingFailure {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `message`, replacing any earlier one.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        if let Some(previous) = &self.message {
            debug!(previous = %previous, "replacing pending build failure");
        }
        self.message = Some(message);
    }

    /// Returns `true` if a failure is waiting for the phase end.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.message.is_some()
    }

    /// The pending failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Reacts to a post-jobs phase event.
    ///
    /// On [`PhaseEvent::End`] with a recorded failure the slot is emptied and
    /// the failure returned as [`BreakerError::BuildBroken`].
    ///
    /// # Errors
    ///
    /// Returns [`BreakerError::BuildBroken`] only for the end event after a
    /// failure was recorded.
    pub fn on_phase_event(&mut self, event: PhaseEvent) -> Result<(), BreakerError> {
        if !event.is_end() {
            return Ok(());
        }
        match self.message.take() {
            Some(message) => {
                error!("{} {}", BUILD_BREAKER_LOG_STAMP, message);
                Err(BreakerError::BuildBroken(message))
            }
            None => Ok(()),
        }
    }
}
