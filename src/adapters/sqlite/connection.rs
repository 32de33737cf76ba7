//! SQLite pool for the contentloop store.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    #[error("Failed to create database directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open {url}: {source}")]
    PoolCreationFailed {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Database did not answer a health check: {0}")]
    ConnectionFailed(#[source] sqlx::Error),
}

/// Pool sizing and lock waits.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database, e.g. while another
    /// `contentloop` process checkpoints arm state.
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(3),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections.max(1),
            ..Self::default()
        }
    }
}

/// WAL journal with relaxed fsync, shared by file and in-memory pools.
fn base_options(url: &str) -> Result<SqliteConnectOptions, ConnectionError> {
    Ok(SqliteConnectOptions::from_str(url)
        .map_err(|_| ConnectionError::InvalidDatabaseUrl(url.to_string()))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal))
}

/// File-backed pool. The database file and its directory are created on
/// first use.
pub async fn create_pool(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, ConnectionError> {
    let config = config.unwrap_or_default();
    if let Some(file) = database_file(database_url) {
        ensure_parent_dir(file)?;
    }

    let options = base_options(database_url)?
        .create_if_missing(true)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::PoolCreationFailed {
            url: database_url.to_string(),
            source,
        })?;

    tracing::debug!(database_url, max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Single-connection in-memory pool for tests.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(base_options(MEMORY_URL)?.shared_cache(true))
        .await
        .map_err(|source| ConnectionError::PoolCreationFailed {
            url: MEMORY_URL.to_string(),
            source,
        })
}

/// Path of the database file behind a `sqlite:` URL; `None` for in-memory
/// databases.
fn database_file(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);

    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

fn ensure_parent_dir(file: &Path) -> Result<(), ConnectionError> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => std::fs::create_dir_all(dir)
            .map_err(|source| ConnectionError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source,
            }),
        _ => Ok(()),
    }
}

pub async fn verify_connection(pool: &SqlitePool) -> Result<(), ConnectionError> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
        .map_err(ConnectionError::ConnectionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_pool_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("contentloop.db");
        let url = format!("sqlite:{}", db_path.display());

        let pool = create_pool(&url, None).await.unwrap();
        verify_connection(&pool).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_memory_pool_connects() {
        let pool = create_test_pool().await.unwrap();
        verify_connection(&pool).await.unwrap();
    }

    #[test]
    fn test_database_file_from_url() {
        assert_eq!(database_file("sqlite:data/cl.db"), Some(Path::new("data/cl.db")));
        assert_eq!(database_file("sqlite://data/cl.db?mode=rwc"), Some(Path::new("data/cl.db")));
        assert_eq!(database_file(MEMORY_URL), None);
        assert_eq!(database_file("sqlite:"), None);
    }

    #[test]
    fn test_pool_config_from_database_config() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::default()
        };
        let pool = PoolConfig::from(&config);
        assert_eq!(pool.max_connections, 1);
        assert_eq!(pool.busy_timeout, Duration::from_secs(30));
    }
}
