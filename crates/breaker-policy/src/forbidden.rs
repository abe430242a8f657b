//! Forbidden configuration check.
//!
//! `sonar.buildbreaker.forbiddenConf` lists `key=value` pairs that must never
//! be active, e.g. `sonar.gallio.mode=skip`. Unlike the issues gate this check
//! fails immediately, before any post job runs.

use breaker_core::config::{BreakerConfig, Settings, SKIP_KEY};
use tracing::{debug, error, warn};

use crate::BreakerError;

/// Fails if any forbidden `key=value` pair is present in `settings`.
///
/// Values are compared after trimming. Entries without `=` are ignored with a
/// warning. Nothing is checked when the breaker is skipped.
///
/// # Errors
///
/// Returns [`BreakerError::ForbiddenConfiguration`] naming the first
/// offending pair.
pub fn check_forbidden_configuration(
    config: &BreakerConfig,
    settings: &Settings,
) -> Result<(), BreakerError> {
    if config.skip {
        debug!("forbidden configuration check is disabled ({} = true)", SKIP_KEY);
        return Ok(());
    }

    for entry in &config.forbidden_conf {
        let Some((key, forbidden)) = entry.split_once('=') else {
            warn!(entry = %entry, "ignoring forbidden configuration entry without '='");
            continue;
        };
        let key = key.trim();
        let forbidden = forbidden.trim();

        if settings
            .get_string(key)
            .is_some_and(|actual| actual.trim() == forbidden)
        {
            let pair = format!("{key}={forbidden}");
            let err = BreakerError::ForbiddenConfiguration(pair);
            error!("{err}");
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use breaker_core::config::FORBIDDEN_CONF_KEY;

    fn settings_with(forbidden: &str, pairs: &[(&str, &str)]) -> (BreakerConfig, Settings) {
        let mut settings = Settings::new();
        settings.set(FORBIDDEN_CONF_KEY, forbidden);
        for (k, v) in pairs {
            settings.set(*k, *v);
        }
        let config = BreakerConfig::from_settings(&settings).unwrap();
        (config, settings)
    }

    #[test]
    fn matching_pair_fails() {
        let (config, settings) = settings_with(
            "sonar.gallio.mode=skip,sonar.foo=bar",
            &[("sonar.foo", " bar ")],
        );
        let err = check_forbidden_configuration(&config, &settings).unwrap_err();
        assert!(matches!(&err, BreakerError::ForbiddenConfiguration(p) if p == "sonar.foo=bar"));
        assert_eq!(
            err.to_string(),
            "[BUILD BREAKER] Forbidden configuration: sonar.foo=bar"
        );
    }

    #[test]
    fn different_value_passes() {
        let (config, settings) =
            settings_with("sonar.gallio.mode=skip", &[("sonar.gallio.mode", "run")]);
        assert!(check_forbidden_configuration(&config, &settings).is_ok());
    }

    #[test]
    fn absent_key_passes() {
        let (config, settings) = settings_with("sonar.gallio.mode=skip", &[]);
        assert!(check_forbidden_configuration(&config, &settings).is_ok());
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let (config, settings) = settings_with("sonar.gallio.mode", &[("sonar.gallio.mode", "")]);
        assert!(check_forbidden_configuration(&config, &settings).is_ok());
    }

    #[test]
    fn empty_forbidden_value_matches_empty_setting() {
        let (config, settings) = settings_with("sonar.branch=", &[("sonar.branch", "")]);
        assert!(check_forbidden_configuration(&config, &settings).is_err());
    }

    #[test]
    fn skip_disables_the_check() {
        let (mut config, settings) = settings_with("sonar.foo=bar", &[("sonar.foo", "bar")]);
        config.skip = true;
        assert!(check_forbidden_configuration(&config, &settings).is_ok());
    }
}
