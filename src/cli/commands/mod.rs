//! Command implementations and the runtime they share.

pub mod arms;
pub mod cycle;
pub mod decisions;
pub mod experiment;
pub mod niche;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapters::sqlite::{
    initialize_database, SqliteArmStateRepository, SqliteOptimizationStateRepository,
};
use crate::domain::models::{Config, OptimizationConfig, SharedOptimization};
use crate::domain::ports::OptimizationStateRepository;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::{ExperimentLifecycleManager, ExperimentOptimizer};

/// Configuration, logging, database, a hydrated lifecycle manager, and the
/// optimization settings left by earlier cycles.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub lifecycle: Arc<ExperimentLifecycleManager>,
    pub optimization: SharedOptimization,
    optimization_state: SqliteOptimizationStateRepository,
    loaded_version: u64,
    _logger: Option<LoggerImpl>,
}

impl AppContext {
    pub async fn bootstrap(config_dir: Option<&Path>) -> Result<Self> {
        let (config, logger) = load_config_and_logging(config_dir)?;
        let mut ctx = Self::open(config).await?;
        ctx._logger = Some(logger);
        Ok(ctx)
    }

    /// Open the database for `config` without touching the global logger.
    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;

        let lifecycle = ExperimentLifecycleManager::new(Arc::new(RwLock::new(ExperimentOptimizer::new())))
            .with_repository(Arc::new(SqliteArmStateRepository::new(pool.clone())))
            .with_schema_version(config.adaptive.schema_version.clone());
        let hydrated = lifecycle
            .hydrate()
            .await
            .context("Failed to load persisted arm state")?;
        tracing::debug!(arms = hydrated, "arm state hydrated");

        let optimization_state = SqliteOptimizationStateRepository::new(pool.clone());
        let optimization = match optimization_state
            .load_optimization()
            .await
            .context("Failed to load optimization state")?
        {
            Some(learned) => config.optimization.clone().with_learned_state(&learned),
            None => config.optimization.clone(),
        };
        let loaded_version = optimization.version();
        tracing::debug!(version = loaded_version, "optimization settings loaded");

        Ok(Self {
            config,
            pool,
            lifecycle: Arc::new(lifecycle),
            optimization: optimization.into_shared(),
            optimization_state,
            loaded_version,
            _logger: None,
        })
    }

    /// Snapshot of the current optimization settings.
    pub async fn optimization_snapshot(&self) -> OptimizationConfig {
        self.optimization.lock().await.clone()
    }

    /// Persist the optimizer's arm state under `trace_id`.
    pub async fn checkpoint(&self, trace_id: &str) -> Result<usize> {
        self.lifecycle
            .checkpoint(trace_id)
            .await
            .context("Failed to persist arm state")
    }

    /// Save the optimization settings if a cycle changed them since load.
    /// Returns whether anything was written.
    pub async fn persist_optimization(&self, trace_id: &str) -> Result<bool> {
        let optimization = self.optimization_snapshot().await;
        if optimization.version() <= self.loaded_version {
            return Ok(false);
        }
        self.optimization_state
            .save_optimization(&optimization, trace_id)
            .await
            .context("Failed to persist optimization state")?;
        Ok(true)
    }
}

/// Load configuration and install the global logger. Keep the returned
/// logger alive until the command finishes.
pub fn load_config_and_logging(config_dir: Option<&Path>) -> Result<(Config, LoggerImpl)> {
    let config = match config_dir {
        Some(dir) => ConfigLoader::load_from_dir(dir)?,
        None => ConfigLoader::load()?,
    };

    let log_config = LogConfig::try_from(&config.logging)?;
    let logger = LoggerImpl::init(&log_config)?;
    Ok((config, logger))
}

/// Read a JSON document from `path`, or stdin when `path` is `-`.
pub(crate) fn read_json_input<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
