//! Port supplying analytics payloads to scheduled adaptive cycles.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::models::AnalyticsPayload;

/// Source of post-analytics payloads. `None` means no more input.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn next_payload(&self) -> DomainResult<Option<AnalyticsPayload>>;
}

/// Fixed queue of payloads, drained in order.
#[derive(Debug, Default)]
pub struct QueuedAnalyticsSource {
    payloads: Mutex<VecDeque<AnalyticsPayload>>,
}

impl QueuedAnalyticsSource {
    pub fn new(payloads: impl IntoIterator<Item = AnalyticsPayload>) -> Self {
        Self {
            payloads: Mutex::new(payloads.into_iter().collect()),
        }
    }
}

#[async_trait]
impl AnalyticsSource for QueuedAnalyticsSource {
    async fn next_payload(&self) -> DomainResult<Option<AnalyticsPayload>> {
        Ok(self.payloads.lock().await.pop_front())
    }
}
