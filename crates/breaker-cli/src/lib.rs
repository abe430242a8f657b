//! Breaker CLI -- command-line interface for the build breaker.
//!
//! This crate provides the `breaker` entry point, argument parsing, exit code
//! definitions and the orchestration that loads settings and issues, runs the
//! post-jobs phase and maps its outcome to a process exit code.

use std::fmt;

pub mod commands;
pub mod report;

// ---------------------------------------------------------------------------
// Exit Codes
// ---------------------------------------------------------------------------

/// Breaker process exit codes.
///
/// These exit codes allow CI/CD pipelines and shell scripts to distinguish
/// between different termination reasons without parsing output.
///
/// | Code | Meaning                                          |
/// |------|--------------------------------------------------|
/// | 0    | All post jobs finished, build not broken         |
/// | 1    | Build broken (threshold reached or forbidden conf) |
/// | 2    | Engine error (unreadable issues, I/O failure)    |
/// | 3    | Configuration error                              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    /// Build not broken.
    Pass = 0,
    /// Build broken.
    BuildBroken = 1,
    /// Engine error (unreadable issues, I/O failure).
    EngineError = 2,
    /// Configuration error (malformed settings, unknown analysis mode).
    ConfigError = 3,
}

impl ExitCode {
    /// Returns the numeric exit code as a `u8`.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns all exit code variants.
    #[must_use]
    pub const fn all() -> &'static [ExitCode] {
        &[
            Self::Pass,
            Self::BuildBroken,
            Self::EngineError,
            Self::ConfigError,
        ]
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pass => "build not broken",
            Self::BuildBroken => "build broken",
            Self::EngineError => "engine error (unreadable issues, I/O failure)",
            Self::ConfigError => "configuration error (malformed settings)",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit code {} ({})", self.as_u8(), self.description())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}

/// Terminate the process with the given [`ExitCode`].
///
/// Logs the exit reason (info for [`ExitCode::Pass`], error otherwise) and
/// returns the matching [`std::process::ExitCode`] for `main`.
pub fn terminate(code: ExitCode) -> std::process::ExitCode {
    match code {
        ExitCode::Pass => {
            tracing::info!(%code, "breaker exiting");
        }
        _ => {
            tracing::error!(%code, "breaker exiting with error");
        }
    }
    code.into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
