//! Issue summary report written as a post job.
//!
//! The report runs alongside the issues breaker and is written even when the
//! build ends up broken, since the breaker only fails once the phase is over.

use std::collections::BTreeMap;
use std::path::PathBuf;

use breaker_core::Severity;
use breaker_policy::{BreakerError, GateFinding, PostJob};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Version of the report layout.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Issue counts for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    /// Report layout version.
    pub schema_version: String,
    /// Project the issues belong to.
    pub project: String,
    /// Number of issues.
    pub total: u32,
    /// Number of issues flagged as new.
    pub new: u32,
    /// Issue count per severity label, every level present.
    pub by_severity: BTreeMap<Severity, u32>,
    /// Issues whose severity label is not on the scale.
    pub unrecognized: u32,
}

/// Counters stop at `u32::MAX`, like `total`.
fn tally(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

/// Counts `issues` by severity and novelty.
pub fn summarize<F: GateFinding>(project: &str, issues: &[F]) -> IssueReport {
    let mut by_severity: BTreeMap<Severity, u32> =
        Severity::all().iter().map(|sev| (*sev, 0)).collect();
    let mut new: u32 = 0;
    let mut unrecognized: u32 = 0;

    for issue in issues {
        if issue.is_new() {
            tally(&mut new);
        }
        match issue.severity() {
            Some(sev) => tally(by_severity.entry(sev).or_default()),
            None => tally(&mut unrecognized),
        }
    }

    IssueReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        project: project.to_string(),
        total: u32::try_from(issues.len()).unwrap_or(u32::MAX),
        new,
        by_severity,
        unrecognized,
    }
}

/// Post job writing an [`IssueReport`] as pretty JSON.
#[derive(Debug, Clone)]
pub struct IssueReportJob {
    path: PathBuf,
}

impl IssueReportJob {
    /// Creates a job writing to `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn job_error(&self, message: String) -> BreakerError {
        BreakerError::Job {
            job: "IssueReport".to_string(),
            message,
        }
    }
}

impl<F: GateFinding> PostJob<F> for IssueReportJob {
    fn name(&self) -> &str {
        "IssueReport"
    }

    fn execute_on(&mut self, project: &str, issues: &[F]) -> Result<(), BreakerError> {
        let report = summarize(project, issues);
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| self.job_error(format!("failed to serialize report: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    self.job_error(format!(
                        "failed to create report directory '{}': {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        std::fs::write(&self.path, json).map_err(|e| {
            self.job_error(format!(
                "failed to write report to '{}': {e}",
                self.path.display()
            ))
        })?;

        info!(path = %self.path.display(), total = report.total, "wrote issue report");
        Ok(())
    }
}
