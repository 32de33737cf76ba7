//! Governed, idempotent post publishing with retry.
//!
//! Every request passes an approval gate before anything is sent. Requests
//! are deduplicated by idempotency key, and transient platform failures are
//! retried with exponential backoff. Each step is appended to an in-memory
//! audit log.

use chrono::Utc;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::domain::errors::PublishError;
use crate::domain::models::{
    AuditEntry, PublishRequest, PublishResult, PublishStatus, PublisherConfig,
};
use crate::domain::ports::PublishClient;

/// Approvals every request must carry.
pub const REQUIRED_APPROVALS: [&str; 3] = ["compliance", "editorial", "rights"];

/// Publishes posts through a [`PublishClient`].
pub struct ContentPublisher {
    client: Arc<dyn PublishClient>,
    config: PublisherConfig,
    seen_keys: Mutex<HashSet<String>>,
    audit_log: Mutex<Vec<AuditEntry>>,
}

impl ContentPublisher {
    pub fn new(client: Arc<dyn PublishClient>, config: PublisherConfig) -> Self {
        Self {
            client,
            config,
            seen_keys: Mutex::new(HashSet::new()),
            audit_log: Mutex::new(Vec::new()),
        }
    }

    /// Publish `request`.
    ///
    /// Returns `Err` only when approvals are missing. Platform failures,
    /// including exhausted retries, come back as a `failed` result.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishResult, PublishError> {
        self.enforce_approval_gate(request).await?;

        let key = match &request.idempotency_key {
            Some(key) => key.clone(),
            None => build_idempotency_key(request),
        };
        let payload = build_payload(request, &key);
        self.audit("publish_attempt", &key, payload.clone()).await;

        // Reserve the key before any attempt; concurrent callers with the
        // same key see it as taken.
        if !self.seen_keys.lock().await.insert(key.clone()) {
            self.audit("publish_duplicate", &key, payload.clone()).await;
            tracing::info!(idempotency_key = %key, "duplicate publish ignored");
            return Ok(result(PublishStatus::DuplicateIgnored, key, None, 0, payload));
        }

        if self.config.dry_run {
            self.audit("publish_dry_run", &key, payload.clone()).await;
            return Ok(result(PublishStatus::DryRun, key, None, 0, payload));
        }

        let outcome = self.send_with_retry(key, payload).await;
        if outcome.status == PublishStatus::Failed {
            self.seen_keys.lock().await.remove(&outcome.idempotency_key);
        }
        Ok(outcome)
    }

    async fn send_with_retry(&self, key: String, payload: Value) -> PublishResult {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.publish_post(&payload, &key).await {
                Ok(post_id) => {
                    self.audit("publish_success", &key, with_fields(&payload, json!({"post_id": post_id})))
                        .await;
                    tracing::info!(idempotency_key = %key, post_id = %post_id, attempt, "published");
                    return result(PublishStatus::Published, key, Some(post_id), attempt, payload);
                }
                Err(PublishError::Transient(error)) => {
                    let details = json!({"attempt": attempt, "error": error});
                    self.audit("publish_retry", &key, with_fields(&payload, details.clone()))
                        .await;
                    if attempt >= max_attempts {
                        self.audit("publish_failed", &key, with_fields(&payload, details))
                            .await;
                        tracing::warn!(idempotency_key = %key, attempt, %error, "publish retries exhausted");
                        return result(PublishStatus::Failed, key, None, attempt, payload);
                    }
                    let delay = self.backoff(attempt);
                    tracing::debug!(idempotency_key = %key, attempt, delay_ms = delay.as_millis() as u64, "retrying publish");
                    sleep(delay).await;
                }
                Err(error) => {
                    let details = json!({"attempt": attempt, "error": error.to_string()});
                    self.audit("publish_failed", &key, with_fields(&payload, details))
                        .await;
                    tracing::warn!(idempotency_key = %key, attempt, %error, "publish failed permanently");
                    return result(PublishStatus::Failed, key, None, attempt, payload);
                }
            }
        }
    }

    /// Delay after the given failed attempt: `base * 2^(attempt - 1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.config.base_backoff_ms.saturating_mul(factor))
    }

    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit_log.lock().await.clone()
    }

    async fn enforce_approval_gate(&self, request: &PublishRequest) -> Result<(), PublishError> {
        let missing: Vec<String> = REQUIRED_APPROVALS
            .iter()
            .filter(|name| !request.approvals.get(**name).copied().unwrap_or(false))
            .map(|name| (*name).to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let key = request.idempotency_key.as_deref().unwrap_or("pending");
        let payload = json!({
            "brief_id": request.brief_id,
            "missing_approvals": missing,
            "provided_approvals": request.approvals,
        });
        self.audit("publish_blocked_missing_approvals", key, payload).await;
        tracing::warn!(brief_id = %request.brief_id, ?missing, "publish blocked by approval gate");
        Err(PublishError::MissingApprovals(missing))
    }

    async fn audit(&self, event: &str, idempotency_key: &str, payload: Value) {
        self.audit_log.lock().await.push(AuditEntry {
            event: event.to_string(),
            idempotency_key: idempotency_key.to_string(),
            timestamp: Utc::now(),
            payload,
        });
    }
}

/// SHA-256 hex digest of the canonical JSON of the request's identity
/// fields.
pub fn build_idempotency_key(request: &PublishRequest) -> String {
    let basis: BTreeMap<&str, Value> = BTreeMap::from([
        ("brief_id", Value::from(request.brief_id.as_str())),
        ("caption", Value::from(request.caption.as_str())),
        ("media_url", Value::from(request.media_url.as_str())),
        ("scheduled_at", scheduled_at(request)),
    ]);
    let canonical = Value::Object(basis.into_iter().map(|(k, v)| (k.to_string(), v)).collect());
    hex::encode(Sha256::digest(canonical.to_string().as_bytes()))
}

fn scheduled_at(request: &PublishRequest) -> Value {
    request
        .scheduled_at
        .map_or(Value::Null, |at| Value::from(at.to_rfc3339()))
}

fn build_payload(request: &PublishRequest, idempotency_key: &str) -> Value {
    json!({
        "brief_id": request.brief_id,
        "media_url": request.media_url,
        "caption": request.caption,
        "scheduled_at": scheduled_at(request),
        "metadata": request.metadata,
        "idempotency_key": idempotency_key,
    })
}

fn with_fields(payload: &Value, extra: Value) -> Value {
    let mut merged = payload.clone();
    if let (Value::Object(target), Value::Object(fields)) = (&mut merged, extra) {
        target.extend(fields);
    }
    merged
}

fn result(
    status: PublishStatus,
    idempotency_key: String,
    platform_post_id: Option<String>,
    attempts: u32,
    payload: Value,
) -> PublishResult {
    PublishResult {
        success: status != PublishStatus::Failed,
        status,
        idempotency_key,
        platform_post_id,
        attempts,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Client that replays scripted responses and counts calls.
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, PublishError>>>,
        calls: Mutex<u32>,
        latency: Duration,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, PublishError>>) -> Arc<Self> {
            Self::slow(responses, Duration::ZERO)
        }

        fn slow(responses: Vec<Result<String, PublishError>>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
                latency,
            })
        }

        async fn calls(&self) -> u32 {
            *self.calls.lock().await
        }
    }

    #[async_trait]
    impl PublishClient for ScriptedClient {
        async fn publish_post(&self, _payload: &Value, _key: &str) -> Result<String, PublishError> {
            *self.calls.lock().await += 1;
            sleep(self.latency).await;
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok("post-default".to_string()))
        }
    }

    fn config(dry_run: bool) -> PublisherConfig {
        PublisherConfig {
            max_attempts: 3,
            base_backoff_ms: 0,
            dry_run,
        }
    }

    fn request() -> PublishRequest {
        PublishRequest {
            brief_id: "brief-1".to_string(),
            media_url: "https://cdn.example/video.mp4".to_string(),
            caption: "Three hooks that work".to_string(),
            ..PublishRequest::default()
        }
        .approved(&REQUIRED_APPROVALS)
    }

    async fn events(publisher: &ContentPublisher) -> Vec<String> {
        publisher.audit_log().await.into_iter().map(|e| e.event).collect()
    }

    #[tokio::test]
    async fn test_missing_approvals_block_before_any_attempt() {
        let client = ScriptedClient::new(vec![]);
        let publisher = ContentPublisher::new(client.clone(), config(false));
        let mut req = request();
        req.approvals.insert("rights".to_string(), false);
        req.approvals.remove("compliance");

        let err = publisher.publish(&req).await.unwrap_err();

        assert_eq!(
            err,
            PublishError::MissingApprovals(vec!["compliance".to_string(), "rights".to_string()])
        );
        assert_eq!(
            err.to_string(),
            "Publish blocked by governance gate; missing required approvals: compliance, rights"
        );
        assert_eq!(client.calls().await, 0);
        assert_eq!(events(&publisher).await, vec!["publish_blocked_missing_approvals"]);
    }

    #[tokio::test]
    async fn test_publish_success() {
        let client = ScriptedClient::new(vec![Ok("ig-123".to_string())]);
        let publisher = ContentPublisher::new(client, config(false));

        let result = publisher.publish(&request()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.status, PublishStatus::Published);
        assert_eq!(result.platform_post_id.as_deref(), Some("ig-123"));
        assert_eq!(result.attempts, 1);
        assert_eq!(result.idempotency_key.len(), 64);
        assert_eq!(events(&publisher).await, vec!["publish_attempt", "publish_success"]);
    }

    #[tokio::test]
    async fn test_duplicate_is_ignored() {
        let client = ScriptedClient::new(vec![]);
        let publisher = ContentPublisher::new(client.clone(), config(false));

        publisher.publish(&request()).await.unwrap();
        let second = publisher.publish(&request()).await.unwrap();

        assert!(second.success);
        assert_eq!(second.status, PublishStatus::DuplicateIgnored);
        assert_eq!(second.attempts, 0);
        assert_eq!(client.calls().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_publish_reaches_platform_once() {
        let client = ScriptedClient::slow(vec![Ok("ig-1".to_string())], Duration::from_millis(50));
        let publisher = ContentPublisher::new(client.clone(), config(false));
        let req = request();

        let (first, second) = tokio::join!(publisher.publish(&req), publisher.publish(&req));
        let mut statuses = vec![first.unwrap().status, second.unwrap().status];
        statuses.sort_by_key(|s| *s == PublishStatus::DuplicateIgnored);

        assert_eq!(statuses, vec![PublishStatus::Published, PublishStatus::DuplicateIgnored]);
        assert_eq!(client.calls().await, 1);
    }

    #[tokio::test]
    async fn test_failed_publish_can_be_retried_later() {
        let client = ScriptedClient::new(vec![
            Err(PublishError::Permanent("platform down".to_string())),
            Ok("ig-2".to_string()),
        ]);
        let publisher = ContentPublisher::new(client.clone(), config(false));

        let first = publisher.publish(&request()).await.unwrap();
        let second = publisher.publish(&request()).await.unwrap();

        assert_eq!(first.status, PublishStatus::Failed);
        assert_eq!(second.status, PublishStatus::Published);
        assert_eq!(second.platform_post_id.as_deref(), Some("ig-2"));
        assert_eq!(client.calls().await, 2);
    }

    #[tokio::test]
    async fn test_dry_run_records_key_without_calling_client() {
        let client = ScriptedClient::new(vec![]);
        let publisher = ContentPublisher::new(client.clone(), config(true));

        let first = publisher.publish(&request()).await.unwrap();
        let second = publisher.publish(&request()).await.unwrap();

        assert_eq!(first.status, PublishStatus::DryRun);
        assert_eq!(second.status, PublishStatus::DuplicateIgnored);
        assert_eq!(client.calls().await, 0);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_then_succeed() {
        let client = ScriptedClient::new(vec![
            Err(PublishError::Transient("rate limited".to_string())),
            Ok("ig-9".to_string()),
        ]);
        let publisher = ContentPublisher::new(client.clone(), config(false));

        let result = publisher.publish(&request()).await.unwrap();

        assert_eq!(result.status, PublishStatus::Published);
        assert_eq!(result.attempts, 2);
        assert_eq!(
            events(&publisher).await,
            vec!["publish_attempt", "publish_retry", "publish_success"]
        );
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_failed() {
        let client = ScriptedClient::new(vec![
            Err(PublishError::Transient("timeout".to_string())),
            Err(PublishError::Transient("timeout".to_string())),
            Err(PublishError::Transient("timeout".to_string())),
        ]);
        let publisher = ContentPublisher::new(client.clone(), config(false));

        let result = publisher.publish(&request()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.status, PublishStatus::Failed);
        assert_eq!(result.attempts, 3);
        assert_eq!(client.calls().await, 3);
        assert_eq!(events(&publisher).await.last().map(String::as_str), Some("publish_failed"));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let client = ScriptedClient::new(vec![Err(PublishError::Permanent("bad media".to_string()))]);
        let publisher = ContentPublisher::new(client.clone(), config(false));

        let result = publisher.publish(&request()).await.unwrap();

        assert_eq!(result.status, PublishStatus::Failed);
        assert_eq!(result.attempts, 1);
        assert_eq!(client.calls().await, 1);
    }

    #[test]
    fn test_idempotency_key_is_stable_and_sensitive() {
        let a = build_idempotency_key(&request());
        assert_eq!(a, build_idempotency_key(&request()));

        let mut changed = request();
        changed.caption.push('!');
        assert_ne!(a, build_idempotency_key(&changed));

        let mut with_meta = request();
        with_meta
            .metadata
            .insert("campaign".to_string(), Value::from("spring"));
        assert_eq!(a, build_idempotency_key(&with_meta));
    }

    #[test]
    fn test_backoff_doubles() {
        let publisher = ContentPublisher::new(
            ScriptedClient::new(vec![]),
            PublisherConfig {
                base_backoff_ms: 500,
                ..config(false)
            },
        );
        assert_eq!(publisher.backoff(1), Duration::from_millis(500));
        assert_eq!(publisher.backoff(2), Duration::from_millis(1000));
        assert_eq!(publisher.backoff(3), Duration::from_millis(2000));
    }
}
