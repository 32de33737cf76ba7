//! Experiment lifecycle: assignment, outcome recording, promotion, archival.
//!
//! Variants live in the optimizer under `exp::{experiment_id}::{variant}`.
//! Promotion and archival leave markers in the arm-state repository so other
//! processes can see the outcome.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ArmKey, ArmRecordKind, LifecycleResult, OptimizationConfig, PostMetrics};
use crate::domain::ports::{ArmStateRepository, NullArmStateRepository};
use crate::services::experiment_optimizer::ExperimentOptimizer;

const DEFAULT_SCHEMA_VERSION: &str = "1.0";
const SYSTEM_TRACE_ID: &str = "system";

/// Runs experiments on top of a shared [`ExperimentOptimizer`].
pub struct ExperimentLifecycleManager {
    optimizer: Arc<RwLock<ExperimentOptimizer>>,
    repository: Arc<dyn ArmStateRepository>,
    schema_version: String,
}

impl ExperimentLifecycleManager {
    /// Manager without persistence.
    pub fn new(optimizer: Arc<RwLock<ExperimentOptimizer>>) -> Self {
        Self {
            optimizer,
            repository: Arc::new(NullArmStateRepository::new()),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn ArmStateRepository>) -> Self {
        self.repository = repository;
        self
    }

    #[must_use]
    pub fn with_schema_version(mut self, schema_version: impl Into<String>) -> Self {
        self.schema_version = schema_version.into();
        self
    }

    pub fn optimizer(&self) -> Arc<RwLock<ExperimentOptimizer>> {
        Arc::clone(&self.optimizer)
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Pick a variant for the next post and return its bare name.
    pub async fn assign_variant(
        &self,
        experiment_id: &str,
        variants: &[String],
        optimization: &OptimizationConfig,
    ) -> DomainResult<String> {
        let arm_keys: Vec<String> = variants
            .iter()
            .map(|variant| ArmKey::experiment(experiment_id, variant))
            .collect();

        let chosen = self
            .optimizer
            .write()
            .await
            .choose_archetype(&arm_keys, optimization)?;
        let variant = arm_keys
            .iter()
            .position(|key| *key == chosen)
            .map_or_else(|| ArmKey::variant(&chosen).to_string(), |idx| variants[idx].clone());

        tracing::debug!(experiment_id, variant = %variant, "assigned variant");
        Ok(variant)
    }

    /// Record the observed metrics of a post that used `variant`.
    pub async fn register_outcome(
        &self,
        experiment_id: &str,
        variant: &str,
        metrics: &PostMetrics,
        optimization: &OptimizationConfig,
    ) -> f64 {
        let arm_key = ArmKey::experiment(experiment_id, variant);
        let reward = self
            .optimizer
            .write()
            .await
            .register_result(&arm_key, metrics, optimization);

        tracing::debug!(experiment_id, variant, reward, "registered outcome");
        reward
    }

    /// Promote the best variant that has at least `min_sample_size_for_winner`
    /// pulls. Ties go to the variant listed first.
    pub async fn promote_winner(
        &self,
        experiment_id: &str,
        variants: &[String],
        min_sample_size_for_winner: u64,
    ) -> DomainResult<LifecycleResult> {
        let best = {
            let optimizer = self.optimizer.read().await;
            let mut best: Option<(&String, u64, f64)> = None;
            for variant in variants {
                let stats = optimizer.stats(&ArmKey::experiment(experiment_id, variant));
                if stats.is_unseen() || stats.pulls < min_sample_size_for_winner {
                    continue;
                }
                let avg = stats.avg_reward();
                match best {
                    Some((_, _, best_avg)) if avg <= best_avg => {}
                    _ => best = Some((variant, stats.pulls, avg)),
                }
            }
            best
        };

        let Some((winner, pulls, avg_reward)) = best else {
            tracing::debug!(experiment_id, min_sample_size_for_winner, "no variant qualified");
            return Ok(LifecycleResult::no_winner());
        };

        let marker = self.repository.build_arm_state_record(
            &ArmKey::winner(experiment_id, winner),
            pulls,
            avg_reward,
            &self.schema_version,
            SYSTEM_TRACE_ID,
        );
        self.repository
            .upsert_arm_states(&[marker], &self.schema_version, SYSTEM_TRACE_ID)
            .await?;

        tracing::info!(experiment_id, winner = %winner, pulls, avg_reward, "promoted winner");
        Ok(LifecycleResult {
            winner: Some(winner.clone()),
            promoted: true,
            archived: false,
        })
    }

    /// Write the archival marker for `experiment_id`. Returns `false` when
    /// there is no persistence and nothing was written.
    pub async fn archive_experiment(&self, experiment_id: &str, trace_id: &str) -> DomainResult<bool> {
        if !self.repository.is_persistent() {
            tracing::debug!(experiment_id, "no arm-state persistence; archive skipped");
            return Ok(false);
        }

        let marker = self.repository.build_arm_state_record(
            &ArmKey::archive(experiment_id),
            1,
            0.0,
            &self.schema_version,
            trace_id,
        );
        self.repository
            .upsert_arm_states(&[marker], &self.schema_version, trace_id)
            .await?;

        tracing::info!(experiment_id, trace_id, "archived experiment");
        Ok(true)
    }

    /// Load persisted arm state into the optimizer. Returns the number of
    /// records imported.
    pub async fn hydrate(&self) -> DomainResult<usize> {
        let records = self.repository.load_arm_states().await?;
        let count = records.len();
        self.optimizer
            .write()
            .await
            .import_arm_state(records.into_iter().map(|r| {
                let stats = r.stats();
                (r.arm_key, stats)
            }));

        tracing::info!(count, "hydrated arm state");
        Ok(count)
    }

    /// Persist the optimizer's arm state. Hydrated winner and archive markers
    /// are skipped so they keep the trace that wrote them. Returns the number
    /// of records written.
    pub async fn checkpoint(&self, trace_id: &str) -> DomainResult<usize> {
        if !self.repository.is_persistent() {
            return Ok(0);
        }

        let records: Vec<_> = self
            .optimizer
            .read()
            .await
            .export_arm_state()
            .into_iter()
            .filter(|(arm_key, _)| {
                !matches!(ArmRecordKind::of(arm_key), ArmRecordKind::Winner | ArmRecordKind::Archive)
            })
            .map(|(arm_key, stats)| {
                self.repository.build_arm_state_record(
                    &arm_key,
                    stats.pulls,
                    stats.reward_sum,
                    &self.schema_version,
                    trace_id,
                )
            })
            .collect();

        self.repository
            .upsert_arm_states(&records, &self.schema_version, trace_id)
            .await?;

        tracing::info!(count = records.len(), trace_id, "checkpointed arm state");
        Ok(records.len())
    }
}
