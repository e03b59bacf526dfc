//! Environment variable names read by [`EnvSignals::from_env`].
//!
//! These are only read once, when a logger is created; the rest of the
//! crate works on the resolved [`EnvSignals`] value.

use crate::level::Level;

/// Set by the AWS Lambda runtime; its presence means "running in the cloud".
pub const AWS_EXECUTION_ENV: &str = "AWS_EXECUTION_ENV";

/// Deployment stage. `prod` or `production` selects the production transport.
pub const STAGE_ENV: &str = "STAGE";

/// Runtime mode. `test` applies the configured test threshold.
pub const APP_ENV: &str = "APP_ENV";

/// Set by most CI systems; mutes loggers created under test.
pub const CI_ENV: &str = "CI";

/// Enables the crate's own diagnostic output on stderr.
pub const LOGGER_DEBUG_ENV: &str = "LOGGER_DEBUG";

/// Overrides every threshold with the named level.
pub const LOGGER_LEVEL_ENV: &str = "LOGGER_LEVEL";

/// Resolved environment signals. Empty variables count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSignals {
    pub execution_env: Option<String>,
    pub stage: Option<String>,
    pub runtime_mode: Option<String>,
    pub ci: bool,
    pub debug: bool,
    pub level_override: Option<String>,
}

impl EnvSignals {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve signals from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            execution_env: get(AWS_EXECUTION_ENV),
            stage: get(STAGE_ENV),
            runtime_mode: get(APP_ENV),
            ci: get(CI_ENV).is_some(),
            debug: get(LOGGER_DEBUG_ENV).is_some(),
            level_override: get(LOGGER_LEVEL_ENV),
        }
    }

    /// Local development: nothing set.
    pub fn local() -> Self {
        Self::default()
    }

    /// Running inside AWS at the given stage.
    pub fn cloud(stage: &str) -> Self {
        Self {
            execution_env: Some("AWS_Lambda_rust".to_string()),
            stage: Some(stage.to_string()),
            ..Self::default()
        }
    }

    pub fn is_cloud(&self) -> bool {
        self.execution_env.is_some()
    }

    pub fn is_production(&self) -> bool {
        matches!(self.stage.as_deref(), Some("prod" | "production"))
    }

    pub fn is_test(&self) -> bool {
        self.runtime_mode.as_deref() == Some("test")
    }

    /// The override level, if set and valid.
    pub fn override_level(&self) -> Option<Level> {
        let raw = self.level_override.as_deref()?;
        match raw.parse() {
            Ok(level) => Some(level),
            Err(err) => {
                tracing::warn!(%err, "ignoring {}", LOGGER_LEVEL_ENV);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> EnvSignals {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvSignals::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn resolves_every_signal() {
        let env = lookup(&[
            (AWS_EXECUTION_ENV, "AWS_Lambda_nodejs"),
            (STAGE_ENV, "prod"),
            (APP_ENV, "test"),
            (CI_ENV, "true"),
            (LOGGER_DEBUG_ENV, "1"),
            (LOGGER_LEVEL_ENV, "warn"),
        ]);
        assert!(env.is_cloud());
        assert!(env.is_production());
        assert!(env.is_test());
        assert!(env.ci);
        assert!(env.debug);
        assert_eq!(env.override_level(), Some(Level::Warn));
    }

    #[test]
    fn empty_values_are_unset() {
        let env = lookup(&[(AWS_EXECUTION_ENV, ""), (CI_ENV, ""), (LOGGER_LEVEL_ENV, "")]);
        assert_eq!(env, EnvSignals::local());
    }

    #[test]
    fn invalid_override_is_ignored() {
        let env = lookup(&[(LOGGER_LEVEL_ENV, "shouting")]);
        assert_eq!(env.override_level(), None);
    }

    #[test]
    fn production_accepts_both_spellings() {
        assert!(EnvSignals::cloud("prod").is_production());
        assert!(EnvSignals::cloud("production").is_production());
        assert!(!EnvSignals::cloud("dev").is_production());
    }
}
