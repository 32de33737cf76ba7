//! Port for carrying learned optimization settings across runs.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::OptimizationConfig;

/// Stores the most recent [`OptimizationConfig`], version included.
#[async_trait]
pub trait OptimizationStateRepository: Send + Sync {
    /// The last saved settings, or `None` before any cycle has saved.
    async fn load_optimization(&self) -> DomainResult<Option<OptimizationConfig>>;

    /// Replace the saved settings.
    async fn save_optimization(&self, optimization: &OptimizationConfig, trace_id: &str) -> DomainResult<()>;
}
