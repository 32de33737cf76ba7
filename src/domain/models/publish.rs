//! Publish requests, results, and the audit trail kept by the publisher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request to publish (or schedule) one rendered asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub brief_id: String,
    pub media_url: String,
    pub caption: String,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Caller-supplied key; derived from the content when absent
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Governance sign-offs by name (`editorial`, `compliance`, `rights`)
    #[serde(default)]
    pub approvals: BTreeMap<String, bool>,
}

impl PublishRequest {
    /// Grant every approval in `names`.
    #[must_use]
    pub fn approved(mut self, names: &[&str]) -> Self {
        for name in names {
            self.approvals.insert((*name).to_string(), true);
        }
        self
    }
}

/// Terminal state of a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    DryRun,
    DuplicateIgnored,
    Failed,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::DryRun => "dry_run",
            Self::DuplicateIgnored => "duplicate_ignored",
            Self::Failed => "failed",
        }
    }
}

/// Result of a publish request. Failures after retries are reported here
/// rather than as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub success: bool,
    pub status: PublishStatus,
    pub idempotency_key: String,
    pub platform_post_id: Option<String>,
    pub attempts: u32,
    pub payload: serde_json::Value,
}

/// One entry in the publisher's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event: String,
    pub idempotency_key: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}
