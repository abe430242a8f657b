//! Settings store and typed build breaker configuration.
//!
//! Settings are a flat string-to-string map resolved from several sources
//! with CLI overrides > explicit file > project > home > defaults precedence.
//! Files are flat `.breaker.yaml` documents whose values must be scalars.
//! [`BreakerConfig`] is the typed view the gate works with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AnalysisMode, CoreError};

// ---------------------------------------------------------------------------
// Setting keys
// ---------------------------------------------------------------------------

/// Disables every breaker when `true`.
pub const SKIP_KEY: &str = "sonar.buildbreaker.skip";

/// Minimum severity an issue needs to break the build.
pub const FAIL_FOR_ISSUES_WITH_SEVERITY_KEY: &str = "sonar.buildbreaker.failForIssuesWithSeverity";

/// Only count issues flagged as new.
pub const FAIL_FOR_NEW_ISSUES_ONLY_KEY: &str = "sonar.buildbreaker.failForNewIssuesOnly";

/// Comma-separated `key=value` pairs that must not be configured.
pub const FORBIDDEN_CONF_KEY: &str = "sonar.buildbreaker.forbiddenConf";

/// Host analysis mode (`publish`, `preview` or `issues`).
pub const ANALYSIS_MODE_KEY: &str = "sonar.analysis.mode";

/// File name looked up in the home and project directories.
pub const SETTINGS_FILE_NAME: &str = ".breaker.yaml";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Flat key/value settings store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the default value of every known key.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut settings = Self::new();
        settings.set(SKIP_KEY, "false");
        settings.set(FAIL_FOR_ISSUES_WITH_SEVERITY_KEY, "");
        settings.set(FAIL_FOR_NEW_ISSUES_ONLY_KEY, "false");
        settings.set(FORBIDDEN_CONF_KEY, "");
        settings.set(ANALYSIS_MODE_KEY, AnalysisMode::default().to_string());
        settings
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the raw value of `key`.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns `true` only when `key` holds `"true"` (case-insensitive).
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_string(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Returns `true` if `key` has a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over all key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlays `other` on top of `self`; keys present in `other` win.
    pub fn merge(&mut self, other: Settings) {
        self.values.extend(other.values);
    }

    /// Applies a single `key=value` override.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `pair` has no `=` or an empty key.
    pub fn apply_override(&mut self, pair: &str) -> Result<(), CoreError> {
        let (key, value) = parse_override(pair)?;
        self.set(key, value);
        Ok(())
    }
}

/// Splits a `key=value` override into its parts. The value may be empty.
///
/// # Errors
///
/// Returns [`CoreError::Config`] if there is no `=` or the key is empty.
pub fn parse_override(pair: &str) -> Result<(String, String), CoreError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| CoreError::Config(format!("override '{pair}' is not of the form key=value")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CoreError::Config(format!("override '{pair}' has an empty key")));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

// ---------------------------------------------------------------------------
// Settings loading
// ---------------------------------------------------------------------------

/// Load and merge settings from multiple sources.
///
/// Resolution order (highest priority first):
/// 1. `overrides` (`key=value` strings, typically `-D` flags)
/// 2. `explicit_file`, which must exist when given
/// 3. `.breaker.yaml` in `project_dir`
/// 4. `.breaker.yaml` in the user home directory
/// 5. Built-in defaults
///
/// # Errors
///
/// Returns [`CoreError::Config`] if a settings file is malformed, the explicit
/// file cannot be read, or an override is not `key=value`.
pub fn load_settings(
    project_dir: Option<&Path>,
    explicit_file: Option<&Path>,
    overrides: &[String],
) -> Result<Settings, CoreError> {
    let home = home_dir();
    load_settings_from(home.as_deref(), project_dir, explicit_file, overrides)
}

/// Same as [`load_settings`], but reads the user layer from `home_dir`
/// instead of `$HOME`. `None` skips the user layer.
pub fn load_settings_from(
    home_dir: Option<&Path>,
    project_dir: Option<&Path>,
    explicit_file: Option<&Path>,
    overrides: &[String],
) -> Result<Settings, CoreError> {
    let mut settings = Settings::with_defaults();

    // Layer 1: Home directory settings.
    if let Some(home) = home_dir {
        let home_file = home.join(SETTINGS_FILE_NAME);
        if home_file.is_file() {
            debug!(path = %home_file.display(), "loading home settings");
            settings.merge(load_settings_file(&home_file)?);
        }
    }

    // Layer 2: Project settings.
    if let Some(dir) = project_dir {
        let project_file = dir.join(SETTINGS_FILE_NAME);
        if project_file.is_file() {
            debug!(path = %project_file.display(), "loading project settings");
            settings.merge(load_settings_file(&project_file)?);
        }
    }

    // Layer 3: Explicit file, must exist.
    if let Some(path) = explicit_file {
        debug!(path = %path.display(), "loading explicit settings file");
        settings.merge(load_settings_file(path)?);
    }

    // Layer 4: -D overrides, in command-line order.
    for pair in overrides {
        settings.apply_override(pair)?;
    }

    info!(keys = settings.len(), "settings loaded");
    Ok(settings)
}

/// Load a single flat YAML settings file.
pub fn load_settings_file(path: &Path) -> Result<Settings, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!(
            "failed to read settings file '{}': {e}",
            path.display()
        ))
    })?;

    parse_settings(&content).map_err(|e| match e {
        CoreError::Config(msg) => {
            CoreError::Config(format!("failed to parse settings file '{}': {msg}", path.display()))
        }
        other => other,
    })
}

/// Parse flat YAML into settings. An empty document yields empty settings.
pub fn parse_settings(content: &str) -> Result<Settings, CoreError> {
    if content.trim().is_empty() {
        return Ok(Settings::new());
    }

    let raw: BTreeMap<String, serde_yml::Value> =
        serde_yml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;

    let mut settings = Settings::new();
    for (key, value) in raw {
        let value = match value {
            serde_yml::Value::Null => String::new(),
            serde_yml::Value::Bool(b) => b.to_string(),
            serde_yml::Value::Number(n) => n.to_string(),
            serde_yml::Value::String(s) => s,
            _ => {
                return Err(CoreError::Config(format!(
                    "value of '{key}' must be a scalar"
                )))
            }
        };
        settings.set(key, value);
    }
    Ok(settings)
}

/// Get the user home directory.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

// ---------------------------------------------------------------------------
// BreakerConfig
// ---------------------------------------------------------------------------

/// Typed build breaker configuration read from [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Disables the breaker entirely.
    pub skip: bool,
    /// Threshold exactly as configured. Resolved against the severity scale
    /// at evaluation time so that a bad value only disables the gate.
    pub fail_for_issues_with_severity: String,
    /// Only count issues flagged as new.
    pub fail_for_new_issues_only: bool,
    /// `key=value` pairs that must not appear in the settings.
    pub forbidden_conf: Vec<String>,
    /// Mode the host analysis runs in.
    pub analysis_mode: AnalysisMode,
}

impl BreakerConfig {
    /// Builds the typed configuration from a settings store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the analysis mode is not recognized.
    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let analysis_mode = match settings.get_string(ANALYSIS_MODE_KEY) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => AnalysisMode::default(),
        };

        let forbidden_conf = settings
            .get_string(FORBIDDEN_CONF_KEY)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            skip: settings.get_bool(SKIP_KEY),
            fail_for_issues_with_severity: settings
                .get_string(FAIL_FOR_ISSUES_WITH_SEVERITY_KEY)
                .unwrap_or_default()
                .to_string(),
            fail_for_new_issues_only: settings.get_bool(FAIL_FOR_NEW_ISSUES_ONLY_KEY),
            forbidden_conf,
            analysis_mode,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
