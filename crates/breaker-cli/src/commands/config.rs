//! The `config` CLI subcommand -- show and validate breaker settings.

use std::path::PathBuf;

use anyhow::Context;

use breaker_core::config::{self, BreakerConfig, Settings};
use breaker_core::Severity;

use crate::ExitCode;

// ---------------------------------------------------------------------------
// ConfigArgs
// ---------------------------------------------------------------------------

/// Manage breaker settings.
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,

    /// Project directory searched for `.breaker.yaml`.
    #[arg(long, default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Additional settings file, applied over home and project settings.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Ignore `~/.breaker.yaml`.
    #[arg(long, global = true)]
    pub no_user_settings: bool,
}

/// Config sub-subcommands.
#[derive(Debug, clap::Subcommand)]
pub enum ConfigAction {
    /// Show the merged settings.
    Show,
    /// Validate the merged settings.
    Validate,
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Executes the `config` subcommand.
///
/// Returns an [`ExitCode`] indicating the outcome.
pub fn execute(args: ConfigArgs) -> Result<ExitCode, anyhow::Error> {
    match args.action {
        ConfigAction::Show => execute_show(&args),
        ConfigAction::Validate => execute_validate(&args),
    }
}

fn load(args: &ConfigArgs) -> Result<Settings, breaker_core::CoreError> {
    let home = if args.no_user_settings { None } else { config::home_dir() };
    config::load_settings_from(
        home.as_deref(),
        Some(&args.project_dir),
        args.settings.as_deref(),
        &[],
    )
}

/// Loads the merged settings, serializes them to YAML, and prints them.
fn execute_show(args: &ConfigArgs) -> Result<ExitCode, anyhow::Error> {
    let settings = load(args).context("failed to load settings")?;

    let yaml = serde_yml::to_string(&settings).context("failed to serialize settings to YAML")?;

    print!("{yaml}");

    Ok(ExitCode::Pass)
}

/// Loads the merged settings and reports whether the breaker can use them.
///
/// Unlike `check`, an unresolvable severity threshold is reported here as a
/// configuration error.
fn execute_validate(args: &ConfigArgs) -> Result<ExitCode, anyhow::Error> {
    // Load errors and an unusable threshold are both reported as problems.
    let problem = match load(args).and_then(|s| BreakerConfig::from_settings(&s)) {
        Ok(cfg) => threshold_problem(&cfg),
        Err(e) => Some(e.to_string()),
    };

    match problem {
        None => {
            println!("Configuration is valid.");
            Ok(ExitCode::Pass)
        }
        Some(msg) => {
            eprintln!("Configuration error: {msg}");
            Ok(ExitCode::ConfigError)
        }
    }
}

/// Describes why the configured threshold cannot be used, if it is set.
fn threshold_problem(cfg: &BreakerConfig) -> Option<String> {
    let raw = cfg.fail_for_issues_with_severity.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Severity>().err().map(|e| {
        let levels: Vec<&str> = Severity::all().iter().map(|s| s.as_str()).collect();
        format!(
            "{} ({}): expected one of {}",
            config::FAIL_FOR_ISSUES_WITH_SEVERITY_KEY,
            e,
            levels.join(", ")
        )
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
