//! Port for the platform client that actually publishes posts.

use async_trait::async_trait;

use crate::domain::errors::PublishError;

/// Platform publishing client.
///
/// Implementations return `PublishError::Transient` for failures worth
/// retrying and `PublishError::Permanent` otherwise. The idempotency key is
/// forwarded so the platform can deduplicate as well.
#[async_trait]
pub trait PublishClient: Send + Sync {
    /// Publish the payload and return the platform post id.
    async fn publish_post(
        &self,
        payload: &serde_json::Value,
        idempotency_key: &str,
    ) -> Result<String, PublishError>;
}
