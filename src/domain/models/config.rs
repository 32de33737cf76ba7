use serde::{Deserialize, Serialize};

use super::adaptive::AdaptiveCapability;
use super::optimization::OptimizationConfig;

/// Main configuration structure for contentloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Initial optimization settings (weights, exploration, promotion threshold)
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Adaptive cycle configuration
    #[serde(default)]
    pub adaptive: AdaptiveConfig,

    /// Publisher retry policy
    #[serde(default)]
    pub publisher: PublisherConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".contentloop/contentloop.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl DatabaseConfig {
    /// `sqlx` connection URL for the configured path.
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Adaptive cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdaptiveConfig {
    /// Sub-loops to run each cycle; none by default
    #[serde(default)]
    pub enabled: Vec<AdaptiveCapability>,

    /// Schema version stamped on persisted arm-state records
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Minimum views before a shadow-test winner is declared
    #[serde(default = "default_shadow_min_views")]
    pub shadow_min_views: u64,

    /// Seconds to sleep between scheduled cycles
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

const fn default_shadow_min_views() -> u64 {
    200
}

const fn default_cycle_interval_secs() -> u64 {
    900
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            schema_version: default_schema_version(),
            shadow_min_views: default_shadow_min_views(),
            cycle_interval_secs: default_cycle_interval_secs(),
        }
    }
}

/// Publisher retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublisherConfig {
    /// Maximum publish attempts per request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt, doubled on each retry
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Record requests without calling the platform
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_backoff_ms() -> u64 {
    500
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            dry_run: false,
        }
    }
}
