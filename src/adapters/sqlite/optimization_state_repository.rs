//! SQLite storage for the learned optimization settings.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::OptimizationConfig;
use crate::domain::ports::OptimizationStateRepository;

#[derive(Clone)]
pub struct SqliteOptimizationStateRepository {
    pool: SqlitePool,
}

impl SqliteOptimizationStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OptimizationStateRepository for SqliteOptimizationStateRepository {
    async fn load_optimization(&self) -> DomainResult<Option<OptimizationConfig>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT version, config FROM optimization_state WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let Some((version, config)) = row else {
            return Ok(None);
        };
        let version = u64::try_from(version).map_err(|_| {
            DomainError::SerializationError(format!("negative optimization version {version}"))
        })?;
        let optimization: OptimizationConfig = serde_json::from_str(&config)?;
        Ok(Some(optimization.with_version(version)))
    }

    async fn save_optimization(&self, optimization: &OptimizationConfig, trace_id: &str) -> DomainResult<()> {
        let version = i64::try_from(optimization.version()).map_err(|_| {
            DomainError::InvalidInput(format!("optimization version {} too large", optimization.version()))
        })?;
        let config = serde_json::to_string(optimization)?;

        sqlx::query(
            "INSERT INTO optimization_state (id, version, config, trace_id, updated_at)
             VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                version = excluded.version,
                config = excluded.config,
                trace_id = excluded.trace_id,
                updated_at = excluded.updated_at",
        )
        .bind(version)
        .bind(&config)
        .bind(trace_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(version, trace_id, "saved optimization state");
        Ok(())
    }
}
