//! Issue severity gate.
//!
//! This module compares collected issues against the configured severity
//! threshold and produces a [`Verdict`]. It never fails: configuration
//! problems short-circuit to [`Verdict::Skipped`] and only a later phase turns
//! a [`Verdict::Fail`] into an error.
//!
//! # Algorithm
//!
//! 1. If the host runs in publish mode, skip.
//! 2. If `sonar.buildbreaker.skip` is set, skip.
//! 3. Resolve the threshold on the severity scale. If it does not name a
//!    level, skip (configuration error, not a build failure).
//! 4. For each issue, ignore it when only new issues count and it is not new;
//!    otherwise count it if its severity is **equal to or higher than** the
//!    threshold.
//! 5. Return [`Verdict::Fail`] with the count if anything was counted,
//!    [`Verdict::Pass`] otherwise.

use breaker_core::config::{BreakerConfig, ANALYSIS_MODE_KEY, SKIP_KEY};
use breaker_core::Severity;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Finding abstraction
// ---------------------------------------------------------------------------

/// Trait that abstracts over issue types so the gate does not depend on how
/// the host collects them.
pub trait GateFinding {
    /// Opaque key used in diagnostics.
    fn key(&self) -> &str;

    /// Severity on the scale, or `None` if the reported label is unknown.
    /// Issues without a resolvable severity are never counted.
    fn severity(&self) -> Option<Severity>;

    /// Returns `true` if the issue is new.
    fn is_new(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Why the gate did not judge the issues at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The host analysis runs in publish mode.
    PublishMode,
    /// The skip setting is enabled.
    SkipFlag,
    /// The threshold does not name a severity. Carries the configured value.
    InvalidThreshold(String),
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    /// The gate was disabled or misconfigured; never breaks the build.
    Skipped {
        /// Why evaluation did not happen.
        reason: SkipReason,
    },
    /// No issue reached the threshold.
    Pass {
        /// Informational summary.
        message: String,
    },
    /// At least one issue reached the threshold.
    Fail {
        /// Number of qualifying issues.
        issue_count: u32,
        /// Failure summary surfaced at phase end.
        message: String,
    },
}

impl Verdict {
    /// Returns `true` for [`Verdict::Fail`].
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// Returns `true` for [`Verdict::Skipped`].
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Number of qualifying issues (zero unless failed).
    #[must_use]
    pub const fn issue_count(&self) -> u32 {
        match self {
            Self::Fail { issue_count, .. } => *issue_count,
            _ => 0,
        }
    }

    /// The summary message, if the gate actually judged the issues.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Skipped { .. } => None,
            Self::Pass { message } | Self::Fail { message, .. } => Some(message.as_str()),
        }
    }

    /// The failure message, present only for [`Verdict::Fail`].
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Fail { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

/// Evaluates `findings` of `project` against the severity threshold in
/// `config`.
///
/// The threshold comparison is inclusive: with a `MAJOR` threshold, `MAJOR`,
/// `CRITICAL` and `BLOCKER` issues all count. Messages quote the threshold
/// exactly as configured.
pub fn evaluate<F: GateFinding>(config: &BreakerConfig, project: &str, findings: &[F]) -> Verdict {
    if config.analysis_mode.is_publish() {
        debug!(
            "issues breaker is disabled ({} == {})",
            ANALYSIS_MODE_KEY, config.analysis_mode
        );
        return Verdict::Skipped {
            reason: SkipReason::PublishMode,
        };
    }

    if config.skip {
        debug!("issues breaker is disabled ({} = true)", SKIP_KEY);
        return Verdict::Skipped {
            reason: SkipReason::SkipFlag,
        };
    }

    let raw_threshold = config.fail_for_issues_with_severity.as_str();
    let threshold = match raw_threshold.parse::<Severity>() {
        Ok(sev) => sev,
        Err(err) => {
            if raw_threshold.trim().is_empty() {
                debug!("no severity threshold configured; issues breaker is inactive");
            } else {
                warn!(
                    threshold = raw_threshold,
                    error = %err,
                    "failForIssuesWithSeverity is invalid; issues breaker is inactive"
                );
            }
            return Verdict::Skipped {
                reason: SkipReason::InvalidThreshold(raw_threshold.to_string()),
            };
        }
    };

    let new_only = config.fail_for_new_issues_only;
    let mut issue_count: u32 = 0;
    for finding in findings {
        if new_only && !finding.is_new() {
            continue;
        }
        match finding.severity() {
            Some(severity) if severity >= threshold => {
                debug!(
                    key = finding.key(),
                    severity = %severity,
                    "recording issue at or above threshold"
                );
                issue_count = issue_count.saturating_add(1);
            }
            Some(_) => {}
            None => debug!(key = finding.key(), "ignoring issue with unrecognized severity"),
        }
    }

    let new_label = if new_only { " new" } else { "" };
    if issue_count > 0 {
        let message = format!(
            "Project {project} has {issue_count}{new_label} issues that are of severity equal or higher than {raw_threshold}"
        );
        debug!("{message}");
        Verdict::Fail {
            issue_count,
            message,
        }
    } else {
        let message = format!(
            "Project {project} has no{new_label} issues with severity equal or higher than {raw_threshold}"
        );
        info!("{message}");
        Verdict::Pass { message }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
