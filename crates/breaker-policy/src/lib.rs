//! Breaker Policy -- issue severity gate and deferred build failure.
//!
//! [`gate::evaluate`] judges a set of findings against the configured
//! severity threshold. A failing verdict is parked in a
//! [`deferred::PendingFailure`] and only surfaced as [`BreakerError::BuildBroken`]
//! once the post-jobs phase has ended, so every other post job gets to finish
//! first. [`phase`] wires both halves together.

use breaker_core::{CoreError, BUILD_BREAKER_LOG_STAMP};

pub mod deferred;
pub mod forbidden;
pub mod gate;
pub mod issue;
pub mod phase;

pub use deferred::PendingFailure;
pub use forbidden::check_forbidden_configuration;
pub use gate::{evaluate, GateFinding, SkipReason, Verdict};
pub use issue::{load_issues, parse_issues, Issue};
pub use phase::{run_post_jobs_phase, IssuesBreaker, PostJob};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that abort the post-jobs phase.
#[derive(Debug, thiserror::Error)]
pub enum BreakerError {
    /// Issues breached the severity threshold. Carries the verdict message.
    #[error("{stamp} {0}", stamp = BUILD_BREAKER_LOG_STAMP)]
    BuildBroken(String),

    /// A forbidden `key=value` pair is present in the settings.
    #[error("{stamp} Forbidden configuration: {0}", stamp = BUILD_BREAKER_LOG_STAMP)]
    ForbiddenConfiguration(String),

    /// A post job failed for reasons unrelated to the gate.
    #[error("post job '{job}' failed: {message}")]
    Job {
        /// Name of the failing job.
        job: String,
        /// Failure description.
        message: String,
    },

    /// An error bubbled up from breaker-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl BreakerError {
    /// Returns `true` if this error means the build must be marked broken.
    #[must_use]
    pub const fn breaks_build(&self) -> bool {
        matches!(self, Self::BuildBroken(_) | Self::ForbiddenConfiguration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_broken_display_is_stamped() {
        let err = BreakerError::BuildBroken("Project demo has 2 issues".to_string());
        assert_eq!(err.to_string(), "[BUILD BREAKER] Project demo has 2 issues");
        assert!(err.breaks_build());
    }

    #[test]
    fn job_error_does_not_break_build() {
        let err = BreakerError::Job {
            job: "report".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "post job 'report' failed: disk full");
        assert!(!err.breaks_build());
    }
}
