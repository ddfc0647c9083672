use crate::config::config::TabqConfig;
use crate::error::{map_io_err, LearnerError, LearnerResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the learning rate
pub const ENV_LEARNING_RATE: &str = "TABQ_LEARNING_RATE";
/// Environment variable overriding the discount factor
pub const ENV_DISCOUNT_FACTOR: &str = "TABQ_DISCOUNT_FACTOR";
/// Environment variable overriding the exploration rate
pub const ENV_EXPLORATION_RATE: &str = "TABQ_EXPLORATION_RATE";

/// The configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader pointing at the default location
    pub fn new() -> Self {
        let config_path = Self::default_config_path();
        Self { config_path }
    }

    /// Set a custom config path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Get the default config path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|config| config.join("tabq").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("tabq.toml"))
    }

    /// Path this loader reads from and writes to
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration
    ///
    /// A missing file yields the defaults. Environment overrides are applied
    /// afterwards and the result is validated.
    pub fn load(&self) -> LearnerResult<TabqConfig> {
        let mut config = if self.config_path.exists() {
            let content =
                fs::read_to_string(&self.config_path).map_err(map_io_err(&self.config_path))?;
            let parsed: TabqConfig = toml::from_str(&content).map_err(|e| {
                LearnerError::parse_error(format!(
                    "failed to parse {}: {}",
                    self.config_path.display(),
                    e
                ))
            })?;
            info!("Loaded configuration from {}", self.config_path.display());
            parsed
        } else {
            debug!(
                "No configuration at {}, using defaults",
                self.config_path.display()
            );
            TabqConfig::default()
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as TOML
    pub fn save(&self, config: &TabqConfig) -> LearnerResult<()> {
        config.validate()?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(map_io_err(parent))?;
            }
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).map_err(map_io_err(&self.config_path))?;
        info!("Saved configuration to {}", self.config_path.display());
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `TABQ_*` overrides using the given variable lookup
pub fn apply_env_overrides(
    config: &mut TabqConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> LearnerResult<()> {
    let targets: [(&str, &mut f64); 3] = [
        (ENV_LEARNING_RATE, &mut config.learner.learning_rate),
        (ENV_DISCOUNT_FACTOR, &mut config.learner.discount_factor),
        (ENV_EXPLORATION_RATE, &mut config.learner.exploration_rate),
    ];

    for (key, slot) in targets {
        if let Some(raw) = lookup(key) {
            let value: f64 = raw.trim().parse().map_err(|_| {
                warn!("Ignoring non-numeric override {}={}", key, raw);
                LearnerError::parse_error(format!("{} must be a number, got '{}'", key, raw))
            })?;
            debug!("Applying override {}={}", key, value);
            *slot = value;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("absent.toml"));
        let config = loader.load().unwrap();
        assert_eq!(config.learner.learning_rate, 0.1);
        assert_eq!(config.training.episodes, 200);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let loader = ConfigLoader::with_path(&path);

        let mut config = TabqConfig::default();
        config.learner.learning_rate = 0.25;
        config.training.seed = Some(7);
        loader.save(&config).unwrap();

        assert!(path.exists());
        let loaded = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(loaded.learner.learning_rate, 0.25);
        assert_eq!(loaded.training.seed, Some(7));
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[learner]\nexploration_rate = 3.0\n").unwrap();

        let err = ConfigLoader::with_path(&path).load().unwrap_err();
        assert!(matches!(err, LearnerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[learner\nlearning_rate = ").unwrap();

        let err = ConfigLoader::with_path(&path).load().unwrap_err();
        assert!(matches!(err, LearnerError::ParseError { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_LEARNING_RATE, "0.5"),
            (ENV_EXPLORATION_RATE, " 0 "),
        ]
        .into_iter()
        .collect();

        let mut config = TabqConfig::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.learner.learning_rate, 0.5);
        assert_eq!(config.learner.discount_factor, 0.9);
        assert_eq!(config.learner.exploration_rate, 0.0);
    }

    #[test]
    fn test_env_override_not_a_number() {
        let mut config = TabqConfig::default();
        let err = apply_env_overrides(&mut config, |key| {
            (key == ENV_DISCOUNT_FACTOR).then(|| "high".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(ENV_DISCOUNT_FACTOR));
    }
}
