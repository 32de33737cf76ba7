//! Null arm-state repository implementation.
//!
//! Used when no storage is wired: the optimizer keeps its state in memory
//! and marker writes are dropped.

use async_trait::async_trait;

use super::arm_state_repository::{ArmStateRecord, ArmStateRepository};
use crate::domain::errors::DomainResult;

/// A no-op arm-state repository that stores nothing.
#[derive(Debug, Clone, Default)]
pub struct NullArmStateRepository;

impl NullArmStateRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArmStateRepository for NullArmStateRepository {
    async fn load_arm_states(&self) -> DomainResult<Vec<ArmStateRecord>> {
        Ok(Vec::new())
    }

    async fn upsert_arm_states(
        &self,
        _records: &[ArmStateRecord],
        _schema_version: &str,
        _trace_id: &str,
    ) -> DomainResult<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
