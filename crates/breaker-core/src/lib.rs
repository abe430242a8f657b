//! Breaker Core -- shared types, settings store and tracing setup.
//!
//! This crate defines the enum types used throughout the build breaker:
//! issue severity levels, the host analysis mode and post-jobs phase events,
//! along with the layered key/value settings store in [`config`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod config;

/// Prefix stamped on every log line that announces a broken build.
pub const BUILD_BREAKER_LOG_STAMP: &str = "[BUILD BREAKER]";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Top-level error type for the breaker-core crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tracing/logging initialization failed.
    #[error("tracing initialization error: {0}")]
    TracingInit(String),
}

/// Convenience alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

// ---------------------------------------------------------------------------
// Tracing / Logging
// ---------------------------------------------------------------------------

/// Initialize structured tracing with the given verbosity level.
///
/// # Behaviour
///
/// | `verbose` | `quiet` | `json_output` | Effect                           |
/// |-----------|---------|---------------|----------------------------------|
/// | `true`    | _       | _             | DEBUG level (per-issue records)  |
/// | _         | `true`  | _             | ERROR level only                 |
/// | `false`   | `false` | _             | INFO level (default)             |
/// | _         | _       | `true`        | JSON-formatted log lines (CI/CD) |
/// | _         | _       | `false`       | Human-readable, compact lines    |
///
/// `RUST_LOG`, when set, takes precedence over the level picked here.
///
/// # Errors
///
/// Returns [`CoreError::TracingInit`] if the global subscriber has already been
/// set (i.e. this function was called more than once in the same process).
pub fn init_tracing(verbose: bool, quiet: bool, json_output: bool) -> Result<(), CoreError> {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_output {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| CoreError::TracingInit(e.to_string()))
    } else {
        fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| CoreError::TracingInit(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Issue severity levels, ordered from lowest to highest impact.
///
/// The derived [`Ord`] follows declaration order, so `Info < Minor < Major <
/// Critical < Blocker` and threshold checks are plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational -- no direct impact.
    Info,
    /// Minor -- quality flaw with little impact.
    Minor,
    /// Major -- quality flaw that can highly impact productivity.
    Major,
    /// Critical -- likely bug or security flaw.
    Critical,
    /// Blocker -- must be fixed immediately.
    Blocker,
}

impl Severity {
    /// Returns the position of this severity on the ordered scale.
    ///
    /// - `Info` = 0
    /// - `Minor` = 1
    /// - `Major` = 2
    /// - `Critical` = 3
    /// - `Blocker` = 4
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Minor => 1,
            Self::Major => 2,
            Self::Critical => 3,
            Self::Blocker => 4,
        }
    }

    /// Returns all severity variants in ascending order (Info first).
    #[must_use]
    pub const fn all() -> &'static [Severity] {
        &[
            Self::Info,
            Self::Minor,
            Self::Major,
            Self::Critical,
            Self::Blocker,
        ]
    }

    /// Returns the canonical uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Minor => "MINOR",
            Self::Major => "MAJOR",
            Self::Critical => "CRITICAL",
            Self::Blocker => "BLOCKER",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A severity string that does not name any level on the scale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized severity '{0}'")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    /// Parses a severity label, ignoring surrounding whitespace and case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// AnalysisMode
// ---------------------------------------------------------------------------

/// Mode the host analysis runs in.
///
/// Issue gating only applies outside of publish mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Results are pushed to the server; issue gating is disabled.
    Publish,
    /// Local preview run.
    #[default]
    Preview,
    /// Incremental issues-only run.
    Issues,
}

impl AnalysisMode {
    /// Returns `true` for [`AnalysisMode::Publish`].
    #[must_use]
    pub const fn is_publish(self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Publish => "publish",
            Self::Preview => "preview",
            Self::Issues => "issues",
        };
        f.write_str(label)
    }
}

impl FromStr for AnalysisMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publish" => Ok(Self::Publish),
            "preview" => Ok(Self::Preview),
            "issues" => Ok(Self::Issues),
            other => Err(CoreError::Config(format!("unknown analysis mode '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseEvent
// ---------------------------------------------------------------------------

/// Lifecycle notification for the post-jobs phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseEvent {
    /// The phase is about to run its jobs.
    Start,
    /// Every job of the phase has completed.
    End,
}

impl PhaseEvent {
    /// Returns `true` once the phase has fully ended.
    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::End => "end",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
