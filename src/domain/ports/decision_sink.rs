//! Port for recording adaptive-cycle decisions.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::CycleDecision;

/// Receives one decision per cycle that produced updates, for audit
/// logging or external persistence.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn record(&self, decision: &CycleDecision) -> DomainResult<()>;
}

/// A sink that discards every decision.
#[derive(Debug, Clone, Default)]
pub struct NullDecisionSink;

#[async_trait]
impl DecisionSink for NullDecisionSink {
    async fn record(&self, _decision: &CycleDecision) -> DomainResult<()> {
        Ok(())
    }
}
