//! The `check` CLI subcommand -- gates collected issues on severity.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error, info};

use breaker_core::config::{home_dir, load_settings_from, BreakerConfig};
use breaker_policy::{
    check_forbidden_configuration, load_issues, run_post_jobs_phase, IssuesBreaker, Issue, PostJob,
};

use crate::report::IssueReportJob;
use crate::ExitCode;

// ---------------------------------------------------------------------------
// CheckArgs
// ---------------------------------------------------------------------------

/// Gate collected issues and break the build if the threshold is reached.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// JSON file with the collected issues.
    #[arg(long, short)]
    pub findings: PathBuf,

    /// Project name used in messages (defaults to the project directory name).
    #[arg(long)]
    pub project: Option<String>,

    /// Project directory searched for `.breaker.yaml`.
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Additional settings file, applied over home and project settings.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Setting override, e.g. `-D sonar.buildbreaker.skip=true` (repeatable).
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub define: Vec<String>,

    /// Ignore `~/.breaker.yaml`.
    #[arg(long)]
    pub no_user_settings: bool,

    /// Write an issue summary report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose output (per-issue diagnostics).
    #[arg(long, short)]
    pub verbose: bool,

    /// Suppress all non-essential output.
    #[arg(long, short)]
    pub quiet: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Derives a project name from the directory when none is given.
fn project_name(explicit: Option<&str>, project_dir: &Path) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }
    std::fs::canonicalize(project_dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string())
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Executes the `check` subcommand.
///
/// Returns an [`ExitCode`] indicating the outcome. Unreadable issue files are
/// returned as errors and reported by `main` as engine errors.
pub fn execute(args: CheckArgs) -> Result<ExitCode, anyhow::Error> {
    // Ignore the error if the subscriber is already set (e.g. in tests).
    let _ = breaker_core::init_tracing(args.verbose, args.quiet, args.json_logs);

    // 1. Load layered settings.
    let home = if args.no_user_settings { None } else { home_dir() };
    let settings = match load_settings_from(
        home.as_deref(),
        Some(&args.project_dir),
        args.settings.as_deref(),
        &args.define,
    ) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "failed to load settings");
            eprintln!("Configuration error: {e}");
            return Ok(ExitCode::ConfigError);
        }
    };

    // 2. Build the typed configuration.
    let config = match BreakerConfig::from_settings(&settings) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid settings");
            eprintln!("Configuration error: {e}");
            return Ok(ExitCode::ConfigError);
        }
    };

    // 3. Forbidden configuration fails before any issue is looked at.
    //    The check already logged the offending pair.
    if let Err(e) = check_forbidden_configuration(&config, &settings) {
        debug!(error = %e, "forbidden configuration");
        return Ok(ExitCode::BuildBroken);
    }

    // 4. Load the collected issues.
    let issues = load_issues(&args.findings).with_context(|| {
        format!("failed to load issues from '{}'", args.findings.display())
    })?;
    let project = project_name(args.project.as_deref(), &args.project_dir);
    info!(project = %project, issues = issues.len(), "checking issues");

    // 5. Run the post-jobs phase: the breaker, then the optional report.
    let mut breaker = IssuesBreaker::new(config);
    let mut report_job = args.report.map(IssueReportJob::new);

    let outcome = {
        let mut jobs: Vec<&mut dyn PostJob<Issue>> = vec![&mut breaker];
        if let Some(job) = report_job.as_mut() {
            jobs.push(job);
        }
        run_post_jobs_phase(&project, &issues, &mut jobs)
    };

    // 6. Map the outcome. A broken build was logged at phase end.
    match outcome {
        Ok(()) => Ok(ExitCode::Pass),
        Err(e) if e.breaks_build() => {
            debug!(error = %e, "build broken");
            Ok(ExitCode::BuildBroken)
        }
        Err(e) => Err(e).context("post-jobs phase failed"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn args(findings: PathBuf, project_dir: PathBuf) -> CheckArgs {
        CheckArgs {
            findings,
            project: Some("demo".to_string()),
            project_dir,
            settings: None,
            define: Vec::new(),
            no_user_settings: true,
            report: None,
            verbose: false,
            quiet: true,
            json_logs: false,
        }
    }

    fn write_issues(dir: &Path) -> PathBuf {
        let path = dir.join("issues.json");
        std::fs::write(
            &path,
            r#"[{"key": "A-1", "severity": "MINOR", "is_new": true},
                {"key": "A-2", "severity": "CRITICAL", "is_new": true},
                {"key": "A-3", "severity": "MAJOR", "is_new": false}]"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn project_name_prefers_explicit() {
        assert_eq!(project_name(Some("api"), Path::new(".")), "api");
    }

    #[test]
    fn project_name_falls_back_to_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("my-service");
        std::fs::create_dir(&dir).unwrap();
        assert_eq!(project_name(None, &dir), "my-service");
    }

    #[test]
    fn execute_breaks_build_above_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = args(write_issues(tmp.path()), tmp.path().to_path_buf());
        a.define = vec!["sonar.buildbreaker.failForIssuesWithSeverity=MAJOR".to_string()];
        assert_eq!(execute(a).unwrap(), ExitCode::BuildBroken);
    }

    #[test]
    fn execute_passes_without_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let a = args(write_issues(tmp.path()), tmp.path().to_path_buf());
        assert_eq!(execute(a).unwrap(), ExitCode::Pass);
    }

    #[test]
    fn execute_forbidden_configuration_breaks_build() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = args(write_issues(tmp.path()), tmp.path().to_path_buf());
        a.define = vec![
            "sonar.buildbreaker.forbiddenConf=sonar.gallio.mode=skip".to_string(),
            "sonar.gallio.mode=skip".to_string(),
        ];
        assert_eq!(execute(a).unwrap(), ExitCode::BuildBroken);
    }

    #[test]
    fn execute_bad_override_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = args(write_issues(tmp.path()), tmp.path().to_path_buf());
        a.define = vec!["not-a-pair".to_string()];
        assert_eq!(execute(a).unwrap(), ExitCode::ConfigError);
    }

    #[test]
    fn execute_missing_findings_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let a = args(tmp.path().join("missing.json"), tmp.path().to_path_buf());
        assert!(execute(a).is_err());
    }
}
