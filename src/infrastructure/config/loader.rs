use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".contentloop";
const ENV_PREFIX: &str = "CONTENTLOOP_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid epsilon_exploration: {0}. Must be between 0 and 1")]
    InvalidEpsilon(f64),

    #[error("Invalid min_sample_size_for_winner: {0}. Must be at least 1")]
    InvalidMinSampleSize(u64),

    #[error("Invalid objective weight for {0}: {1}. Must be finite and non-negative")]
    InvalidObjectiveWeight(String, f64),

    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Schema version cannot be empty")]
    EmptySchemaVersion,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .contentloop/config.yaml
    /// 3. .contentloop/local.yaml (optional local overrides)
    /// 4. Environment variables (CONTENTLOOP_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Same as [`load`](Self::load) with the YAML files read from `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to extract configuration from {}", dir.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        if !VALID_LOG_FORMATS.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let optimization = &config.optimization;
        let epsilon = optimization.epsilon_exploration();
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ConfigError::InvalidEpsilon(epsilon));
        }
        if optimization.min_sample_size_for_winner() == 0 {
            return Err(ConfigError::InvalidMinSampleSize(0));
        }
        for (metric, weight) in optimization.objective_weights() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidObjectiveWeight(metric.clone(), *weight));
            }
        }

        if config.adaptive.schema_version.trim().is_empty() {
            return Err(ConfigError::EmptySchemaVersion);
        }

        if config.publisher.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(0));
        }

        Ok(())
    }
}
