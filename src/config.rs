//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::onboarding::state::{DEFAULT_TOTAL_STEPS, MAX_HEALTH_CONCERNS};

/// Intake wizard configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Number of progress steps tracked by the step cursor.
    pub total_steps: usize,
    /// Maximum number of health concerns a user may pick.
    pub max_health_concerns: usize,
    /// Location of the libSQL database file.
    pub db_path: PathBuf,
    /// Optional reference-data file replacing the built-in catalog.
    pub catalog_path: Option<PathBuf>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            total_steps: DEFAULT_TOTAL_STEPS,
            max_health_concerns: MAX_HEALTH_CONCERNS,
            db_path: PathBuf::from("./data/health-intake.db"),
            catalog_path: None,
        }
    }
}

impl IntakeConfig {
    /// Build from `HEALTH_INTAKE_*` environment variables over the defaults.
    ///
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            total_steps: parse_or(
                &lookup,
                "HEALTH_INTAKE_TOTAL_STEPS",
                defaults.total_steps,
            ),
            max_health_concerns: parse_or(
                &lookup,
                "HEALTH_INTAKE_MAX_CONCERNS",
                defaults.max_health_concerns,
            ),
            db_path: lookup("HEALTH_INTAKE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            catalog_path: lookup("HEALTH_INTAKE_CATALOG").map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_steps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "total_steps".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_health_concerns == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_health_concerns".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "Ignoring invalid number");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = IntakeConfig::default();
        assert_eq!(config.total_steps, 4);
        assert_eq!(config.max_health_concerns, 5);
        assert!(config.catalog_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides() {
        let config = IntakeConfig::from_lookup(lookup_from(&[
            ("HEALTH_INTAKE_TOTAL_STEPS", "5"),
            ("HEALTH_INTAKE_MAX_CONCERNS", " 3 "),
            ("HEALTH_INTAKE_DB_PATH", "/tmp/x.db"),
            ("HEALTH_INTAKE_CATALOG", "/tmp/catalog.json"),
        ]));
        assert_eq!(config.total_steps, 5);
        assert_eq!(config.max_health_concerns, 3);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = IntakeConfig::from_lookup(lookup_from(&[(
            "HEALTH_INTAKE_MAX_CONCERNS",
            "lots",
        )]));
        assert_eq!(config.max_health_concerns, 5);
    }

    #[test]
    fn zero_values_are_rejected() {
        let config = IntakeConfig {
            max_health_concerns: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
