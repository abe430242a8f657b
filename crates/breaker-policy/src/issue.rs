//! Collected issues as handed over by the host analysis.
//!
//! Issues are read from a JSON document that is either a bare array or an
//! object with an `issues` array:
//!
//! ```json
//! { "issues": [ { "key": "AX-1", "severity": "MAJOR", "is_new": true } ] }
//! ```
//!
//! The severity is kept as the raw string the host reported; it is resolved
//! against the scale only when the gate looks at it.

use std::path::Path;

use breaker_core::{CoreError, Severity};
use serde::{Deserialize, Serialize};

use crate::gate::GateFinding;

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Opaque issue key, only used in diagnostics.
    pub key: String,

    /// Severity label as reported by the host. A missing or `null` severity
    /// is kept as `None` and never counted by the gate.
    #[serde(default)]
    pub severity: Option<String>,

    /// `true` if the issue was introduced by the analyzed change.
    #[serde(default, alias = "isNew")]
    pub is_new: bool,

    /// Rule that raised the issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// File or module the issue belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Issue {
    /// Creates an issue with only the fields the gate cares about.
    #[must_use]
    pub fn new(key: impl Into<String>, severity: impl Into<String>, is_new: bool) -> Self {
        Self {
            key: key.into(),
            severity: Some(severity.into()),
            is_new,
            rule: None,
            component: None,
            message: None,
        }
    }
}

impl GateFinding for Issue {
    fn key(&self) -> &str {
        &self.key
    }

    fn severity(&self) -> Option<Severity> {
        self.severity.as_deref().and_then(|raw| raw.parse().ok())
    }

    fn is_new(&self) -> bool {
        self.is_new
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IssuesDocument {
    Bare(Vec<Issue>),
    Wrapped { issues: Vec<Issue> },
}

/// Parses issues from a JSON string.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if the document matches neither layout.
pub fn parse_issues(json: &str) -> Result<Vec<Issue>, CoreError> {
    let doc: IssuesDocument = serde_json::from_str(json)?;
    Ok(match doc {
        IssuesDocument::Bare(issues) | IssuesDocument::Wrapped { issues } => issues,
    })
}

/// Reads and parses an issues file.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be read and
/// [`CoreError::Serialization`] if it is not a valid issues document.
pub fn load_issues(path: &Path) -> Result<Vec<Issue>, CoreError> {
    let content = std::fs::read_to_string(path)?;
    let issues = parse_issues(&content)?;
    tracing::debug!(path = %path.display(), count = issues.len(), "loaded issues");
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::evaluate;
    use breaker_core::config::BreakerConfig;

    #[test]
    fn parse_bare_array() {
        let issues = parse_issues(
            r#"[{"key": "A-1", "severity": "MAJOR", "is_new": true},
                {"key": "A-2", "severity": "info"}]"#,
        )
        .unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].is_new);
        assert!(!issues[1].is_new, "is_new defaults to false");
    }

    #[test]
    fn parse_wrapped_object_with_camel_case_flag() {
        let issues = parse_issues(
            r#"{"issues": [{"key": "A-1", "severity": "BLOCKER", "isNew": true,
                            "rule": "java:S1234", "component": "src/Main.java"}]}"#,
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_new);
        assert_eq!(issues[0].rule.as_deref(), Some("java:S1234"));
        assert_eq!(issues[0].component.as_deref(), Some("src/Main.java"));
    }

    #[test]
    fn parse_rejects_unexpected_layout() {
        assert!(matches!(
            parse_issues(r#"{"findings": []}"#),
            Err(CoreError::Serialization(_))
        ));
        assert!(parse_issues("not json").is_err());
    }

    #[test]
    fn issue_severity_resolves_leniently() {
        assert_eq!(Issue::new("k", " critical ", false).severity(), Some(Severity::Critical));
        assert_eq!(Issue::new("k", "SEVERE", false).severity(), None);
    }

    #[test]
    fn missing_or_null_severity_is_kept_and_never_counted() {
        let issues = parse_issues(
            r#"[{"key": "A-1", "severity": null, "is_new": true},
                {"key": "A-2", "severity": "BLOCKER", "is_new": true},
                {"key": "A-3", "is_new": true}]"#,
        )
        .unwrap();
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].severity, None);
        assert_eq!(issues[0].severity(), None);
        assert_eq!(issues[2].severity(), None);

        let config = BreakerConfig {
            fail_for_issues_with_severity: "INFO".to_string(),
            ..BreakerConfig::default()
        };
        let verdict = evaluate(&config, "demo", &issues);
        assert!(verdict.is_fail());
        assert_eq!(verdict.issue_count(), 1);
    }

    #[test]
    fn load_issues_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("issues.json");
        std::fs::write(&path, r#"[{"key": "A-1", "severity": "MINOR"}]"#).unwrap();
        let issues = load_issues(&path).unwrap();
        assert_eq!(issues, vec![Issue::new("A-1", "MINOR", false)]);
    }

    #[test]
    fn load_issues_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let result = load_issues(&tmp.path().join("missing.json"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
