//! SQLite decision log: one row per adaptive cycle that produced updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::{CycleDecision, CycleUpdates};
use crate::domain::ports::DecisionSink;

const DECISION_TYPE: &str = "adaptive_cycle";

/// A stored decision row.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionLogEntry {
    pub id: Uuid,
    pub run_id: String,
    pub decision_type: String,
    pub trace_id: String,
    pub updates: CycleUpdates,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SqliteDecisionLogRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DecisionRow {
    id: String,
    run_id: String,
    decision_type: String,
    decision_payload: String,
    trace_id: String,
    created_at: String,
}

impl TryFrom<DecisionRow> for DecisionLogEntry {
    type Error = crate::domain::errors::DomainError;

    fn try_from(row: DecisionRow) -> Result<Self, Self::Error> {
        Ok(DecisionLogEntry {
            id: parse_uuid(&row.id)?,
            run_id: row.run_id,
            decision_type: row.decision_type,
            trace_id: row.trace_id,
            updates: serde_json::from_str(&row.decision_payload)?,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

impl SqliteDecisionLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent decisions first.
    pub async fn list_recent(&self, limit: u32) -> DomainResult<Vec<DecisionLogEntry>> {
        let rows: Vec<DecisionRow> = sqlx::query_as(
            "SELECT id, run_id, decision_type, decision_payload, trace_id, created_at
             FROM decision_log ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DecisionLogEntry::try_from).collect()
    }
}

#[async_trait]
impl DecisionSink for SqliteDecisionLogRepository {
    async fn record(&self, decision: &CycleDecision) -> DomainResult<()> {
        let payload = serde_json::to_string(&decision.updates)?;
        sqlx::query(
            "INSERT INTO decision_log (id, run_id, decision_type, decision_payload, trace_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&decision.trace_id)
        .bind(DECISION_TYPE)
        .bind(payload)
        .bind(&decision.trace_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(trace_id = %decision.trace_id, updates = decision.updates.len(), "decision logged");
        Ok(())
    }
}
