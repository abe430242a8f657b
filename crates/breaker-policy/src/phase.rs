//! Post-jobs phase: runs every post job on the collected issues, then
//! announces the end of the phase so deferred failures can surface.

use breaker_core::config::BreakerConfig;
use breaker_core::PhaseEvent;
use tracing::{debug, info};

use crate::deferred::PendingFailure;
use crate::gate::{evaluate, GateFinding, Verdict};
use crate::BreakerError;

// ---------------------------------------------------------------------------
// PostJob
// ---------------------------------------------------------------------------

/// A job that runs once per project after all issues are collected.
///
/// Jobs that also need to observe the phase lifecycle override
/// [`PostJob::on_post_jobs_phase`].
pub trait PostJob<F: GateFinding> {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Runs the job on the issues of `project`.
    fn execute_on(&mut self, project: &str, issues: &[F]) -> Result<(), BreakerError>;

    /// Receives post-jobs phase events. Does nothing by default.
    fn on_post_jobs_phase(&mut self, event: PhaseEvent) -> Result<(), BreakerError> {
        let _ = event;
        Ok(())
    }
}

/// Runs the post-jobs phase for one project.
///
/// Every job sees [`PhaseEvent::Start`], then all jobs execute in order, then
/// every job sees [`PhaseEvent::End`]. A failing job aborts the phase
/// immediately. Errors raised on the end event do not stop the remaining jobs
/// from being notified; the first one is returned.
///
/// # Errors
///
/// Returns the first job error, or the first error raised on phase events.
pub fn run_post_jobs_phase<F: GateFinding>(
    project: &str,
    issues: &[F],
    jobs: &mut [&mut dyn PostJob<F>],
) -> Result<(), BreakerError> {
    debug!(project, jobs = jobs.len(), "post-jobs phase starting");
    for job in jobs.iter_mut() {
        job.on_post_jobs_phase(PhaseEvent::Start)?;
    }

    for job in jobs.iter_mut() {
        debug!(job = job.name(), "executing post job");
        job.execute_on(project, issues)?;
    }

    let mut first_error = None;
    for job in jobs.iter_mut() {
        if let Err(err) = job.on_post_jobs_phase(PhaseEvent::End) {
            first_error.get_or_insert(err);
        }
    }
    debug!(project, "post-jobs phase ended");

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// IssuesBreaker
// ---------------------------------------------------------------------------

/// Post job that gates issues on severity and breaks the build at phase end.
#[derive(Debug, Clone)]
pub struct IssuesBreaker {
    config: BreakerConfig,
    pending: PendingFailure,
    verdict: Option<Verdict>,
}

impl IssuesBreaker {
    /// Creates a breaker for the given configuration.
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            pending: PendingFailure::new(),
            verdict: None,
        }
    }

    /// Verdict of the last evaluation, if the job has run.
    #[must_use]
    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// The pending failure slot.
    #[must_use]
    pub fn pending(&self) -> &PendingFailure {
        &self.pending
    }
}

impl<F: GateFinding> PostJob<F> for IssuesBreaker {
    fn name(&self) -> &str {
        "IssuesBreaker"
    }

    fn execute_on(&mut self, project: &str, issues: &[F]) -> Result<(), BreakerError> {
        let verdict = evaluate(&self.config, project, issues);
        if let Some(message) = verdict.failure_message() {
            // Other post jobs still need the issues; fail on phase end.
            info!(project, "marking build as failed once post jobs have finished");
            self.pending.record_failure(message);
        }
        self.verdict = Some(verdict);
        Ok(())
    }

    fn on_post_jobs_phase(&mut self, event: PhaseEvent) -> Result<(), BreakerError> {
        self.pending.on_phase_event(event)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Issue;

    /// Records the order in which it is driven.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_execute: bool,
    }

    impl PostJob<Issue> for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn execute_on(&mut self, project: &str, issues: &[Issue]) -> Result<(), BreakerError> {
            self.calls.push(format!("execute {project} {}", issues.len()));
            if self.fail_execute {
                return Err(BreakerError::Job {
                    job: "recorder".to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn on_post_jobs_phase(&mut self, event: PhaseEvent) -> Result<(), BreakerError> {
            self.calls.push(format!("event {event}"));
            Ok(())
        }
    }

    fn config(threshold: &str) -> BreakerConfig {
        BreakerConfig {
            fail_for_issues_with_severity: threshold.to_string(),
            ..BreakerConfig::default()
        }
    }

    fn issues() -> Vec<Issue> {
        vec![
            Issue::new("A-1", "MINOR", true),
            Issue::new("A-2", "CRITICAL", true),
            Issue::new("A-3", "MAJOR", false),
        ]
    }

    #[test]
    fn failing_verdict_surfaces_only_at_phase_end() {
        let mut breaker = IssuesBreaker::new(config("MAJOR"));
        let mut recorder = Recorder::default();

        let result = {
            let mut jobs: Vec<&mut dyn PostJob<Issue>> = vec![&mut breaker, &mut recorder];
            run_post_jobs_phase("demo", &issues(), &mut jobs)
        };

        let err = result.unwrap_err();
        assert!(matches!(&err, BreakerError::BuildBroken(msg) if msg.contains("has 2 issues")));
        // The job after the breaker still ran and saw the end event.
        assert_eq!(
            recorder.calls,
            vec!["event start", "execute demo 3", "event end"]
        );
        assert_eq!(breaker.verdict().map(Verdict::issue_count), Some(2));
        assert!(!breaker.pending().is_recorded(), "end event consumes the failure");
    }

    #[test]
    fn passing_verdict_never_errors() {
        let mut breaker = IssuesBreaker::new(config("BLOCKER"));
        let result = {
            let mut jobs: Vec<&mut dyn PostJob<Issue>> = vec![&mut breaker];
            run_post_jobs_phase("demo", &issues(), &mut jobs)
        };
        assert!(result.is_ok());
        assert!(matches!(breaker.verdict(), Some(Verdict::Pass { .. })));
    }

    #[test]
    fn breaker_is_silent_before_phase_end() {
        let mut breaker = IssuesBreaker::new(config("INFO"));
        PostJob::<Issue>::on_post_jobs_phase(&mut breaker, PhaseEvent::Start).unwrap();
        PostJob::<Issue>::execute_on(&mut breaker, "demo", &issues()).unwrap();
        assert!(breaker.pending().is_recorded());
        assert!(PostJob::<Issue>::on_post_jobs_phase(&mut breaker, PhaseEvent::Start).is_ok());
        assert!(PostJob::<Issue>::on_post_jobs_phase(&mut breaker, PhaseEvent::End).is_err());
    }

    #[test]
    fn job_error_aborts_before_phase_end() {
        let mut breaker = IssuesBreaker::new(config("INFO"));
        let mut recorder = Recorder {
            fail_execute: true,
            ..Recorder::default()
        };

        let result = {
            let mut jobs: Vec<&mut dyn PostJob<Issue>> = vec![&mut breaker, &mut recorder];
            run_post_jobs_phase("demo", &issues(), &mut jobs)
        };

        assert!(matches!(result, Err(BreakerError::Job { .. })));
        assert!(!recorder.calls.contains(&"event end".to_string()));
        // The failure never reached the end event, so it is still pending.
        assert!(breaker.pending().is_recorded());
    }

    #[test]
    fn skipped_breaker_records_nothing() {
        let mut breaker = IssuesBreaker::new(BreakerConfig {
            skip: true,
            ..config("INFO")
        });
        let result = {
            let mut jobs: Vec<&mut dyn PostJob<Issue>> = vec![&mut breaker];
            run_post_jobs_phase("demo", &issues(), &mut jobs)
        };
        assert!(result.is_ok());
        assert!(breaker.verdict().is_some_and(Verdict::is_skipped));
    }
}
