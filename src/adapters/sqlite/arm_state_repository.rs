//! SQLite implementation of the ArmStateRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{ArmStateRecord, ArmStateRepository};

#[derive(Clone)]
pub struct SqliteArmStateRepository {
    pool: SqlitePool,
}

impl SqliteArmStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ArmStateRow {
    arm_key: String,
    schema_version: String,
    trace_id: String,
    pulls: i64,
    reward_sum: f64,
}

impl TryFrom<ArmStateRow> for ArmStateRecord {
    type Error = DomainError;

    fn try_from(row: ArmStateRow) -> Result<Self, Self::Error> {
        let pulls = u64::try_from(row.pulls).map_err(|_| {
            DomainError::SerializationError(format!(
                "negative pull count {} for arm {}",
                row.pulls, row.arm_key
            ))
        })?;
        Ok(ArmStateRecord {
            arm_key: row.arm_key,
            pulls,
            reward_sum: row.reward_sum,
            schema_version: row.schema_version,
            trace_id: row.trace_id,
        })
    }
}

#[async_trait]
impl ArmStateRepository for SqliteArmStateRepository {
    async fn load_arm_states(&self) -> DomainResult<Vec<ArmStateRecord>> {
        let rows: Vec<ArmStateRow> = sqlx::query_as(
            "SELECT arm_key, schema_version, trace_id, pulls, reward_sum
             FROM experiment_arm_states ORDER BY arm_key",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ArmStateRecord::try_from).collect()
    }

    async fn upsert_arm_states(
        &self,
        records: &[ArmStateRecord],
        schema_version: &str,
        trace_id: &str,
    ) -> DomainResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for record in records {
            let pulls = i64::try_from(record.pulls).map_err(|_| {
                DomainError::InvalidInput(format!("pull count too large for arm {}", record.arm_key))
            })?;
            sqlx::query(
                "INSERT INTO experiment_arm_states
                    (arm_key, schema_version, trace_id, pulls, reward_sum, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(arm_key) DO UPDATE SET
                    schema_version = excluded.schema_version,
                    trace_id = excluded.trace_id,
                    pulls = excluded.pulls,
                    reward_sum = excluded.reward_sum,
                    updated_at = excluded.updated_at",
            )
            .bind(&record.arm_key)
            .bind(schema_version)
            .bind(trace_id)
            .bind(pulls)
            .bind(record.reward_sum)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(count = records.len(), trace_id, "upserted arm states");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::ArmRecordKind;

    async fn setup() -> SqliteArmStateRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteArmStateRepository::new(pool)
    }

    #[tokio::test]
    async fn test_empty_table_loads_nothing() {
        let repo = setup().await;
        assert!(repo.load_arm_states().await.unwrap().is_empty());
        assert!(repo.is_persistent());
    }

    #[tokio::test]
    async fn test_upsert_round_trips_exactly() {
        let repo = setup().await;
        let record = repo.build_arm_state_record("exp::e1::a", 7, 123.456789, "1.0", "t-1");

        repo.upsert_arm_states(&[record.clone()], "1.0", "t-1")
            .await
            .unwrap();

        assert_eq!(repo.load_arm_states().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_upsert_is_last_writer_wins() {
        let repo = setup().await;
        let first = repo.build_arm_state_record("exp::e1::a", 1, 1.0, "1.0", "t-1");
        let second = repo.build_arm_state_record("exp::e1::a", 2, 5.0, "1.0", "t-2");

        repo.upsert_arm_states(&[first], "1.0", "t-1").await.unwrap();
        repo.upsert_arm_states(&[second], "1.1", "t-2").await.unwrap();

        let loaded = repo.load_arm_states().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pulls, 2);
        assert!((loaded[0].reward_sum - 5.0).abs() < f64::EPSILON);
        assert_eq!(loaded[0].schema_version, "1.1");
        assert_eq!(loaded[0].trace_id, "t-2");
    }

    #[tokio::test]
    async fn test_markers_are_classified() {
        let repo = setup().await;
        let records = vec![
            repo.build_arm_state_record("winner::e1::a", 20, 4.5, "1.0", "system"),
            repo.build_arm_state_record("archive::e1", 1, 0.0, "1.0", "t-9"),
        ];
        repo.upsert_arm_states(&records, "1.0", "t-9").await.unwrap();

        let kinds: Vec<_> = repo
            .load_arm_states()
            .await
            .unwrap()
            .iter()
            .map(ArmStateRecord::kind)
            .collect();
        assert_eq!(kinds, vec![ArmRecordKind::Archive, ArmRecordKind::Winner]);
    }
}
