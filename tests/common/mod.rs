//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use contentloop::adapters::sqlite::{create_migrated_test_pool, SqliteArmStateRepository};
use contentloop::domain::models::PostMetrics;
use contentloop::services::{ExperimentLifecycleManager, ExperimentOptimizer};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

/// Fresh in-memory database with all migrations applied.
pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create migrated test pool")
}

/// Lifecycle manager backed by SQLite with a seeded optimizer.
pub fn sqlite_lifecycle(pool: &SqlitePool, seed: u64) -> ExperimentLifecycleManager {
    ExperimentLifecycleManager::new(Arc::new(RwLock::new(ExperimentOptimizer::with_seed(seed))))
        .with_repository(Arc::new(SqliteArmStateRepository::new(pool.clone())))
        .with_schema_version("1.0")
}

/// Metrics for a post with the given saves and shares and nothing else.
pub fn post(saves: u64, shares: u64) -> PostMetrics {
    PostMetrics {
        brief_id: "brief".to_string(),
        saves,
        shares,
        ..PostMetrics::default()
    }
}
