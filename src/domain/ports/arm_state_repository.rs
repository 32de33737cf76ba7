//! Repository port for persisted bandit arm state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{ArmRecordKind, ArmStats};

/// Persisted form of one arm, keyed by `arm_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmStateRecord {
    pub arm_key: String,
    pub pulls: u64,
    pub reward_sum: f64,
    pub schema_version: String,
    pub trace_id: String,
}

impl ArmStateRecord {
    pub fn kind(&self) -> ArmRecordKind {
        ArmRecordKind::of(&self.arm_key)
    }

    pub const fn stats(&self) -> ArmStats {
        ArmStats::new(self.pulls, self.reward_sum)
    }
}

/// Storage for arm state so bandit experiments survive restarts.
///
/// Upserts are last-writer-wins per `arm_key`.
#[async_trait]
pub trait ArmStateRepository: Send + Sync {
    /// Load every persisted arm record.
    async fn load_arm_states(&self) -> DomainResult<Vec<ArmStateRecord>>;

    /// Insert or replace records by `arm_key`, stamping each with the given
    /// schema version and trace id.
    async fn upsert_arm_states(
        &self,
        records: &[ArmStateRecord],
        schema_version: &str,
        trace_id: &str,
    ) -> DomainResult<()>;

    /// Build a record in the shape this repository stores.
    fn build_arm_state_record(
        &self,
        arm_key: &str,
        pulls: u64,
        reward_sum: f64,
        schema_version: &str,
        trace_id: &str,
    ) -> ArmStateRecord {
        ArmStateRecord {
            arm_key: arm_key.to_string(),
            pulls,
            reward_sum,
            schema_version: schema_version.to_string(),
            trace_id: trace_id.to_string(),
        }
    }

    /// Whether writes are actually retained.
    fn is_persistent(&self) -> bool {
        true
    }
}
