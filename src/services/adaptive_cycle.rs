//! Adaptive cycle coordinator.
//!
//! Runs between analytics ingestion and the next planning round. Each
//! enabled [`AdaptiveCapability`] is an [`AdaptiveStep`]; steps run in
//! capability order while the coordinator holds the shared
//! [`OptimizationConfig`](crate::domain::models::OptimizationConfig) lock,
//! so a cycle is the single writer for its whole update phase.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AdaptiveCapability, AnalyticsPayload, CycleDecision, CycleReport, CycleUpdates,
    LearningLoopReport, LifecycleUpdate, Mode, OptimizationConfig, SharedOptimization, StepUpdate,
};
use crate::domain::ports::{AnalyticsSource, DecisionSink, NullDecisionSink};
use crate::services::experiment_lifecycle::ExperimentLifecycleManager;
use crate::services::learning_strategy::{LearningLoopUpdater, ObjectiveAwareStrategyUpdater};
use crate::services::mode_controller::ModeController;
use crate::services::monetization_analytics::MonetizationAnalyst;
use crate::services::shadow_testing::{ShadowTestEvaluator, DEFAULT_MIN_VIEWS};

const DEFAULT_OBJECTIVE: &str = "engagement";
const DEFAULT_EXPLORE_COEF: f64 = 0.2;

/// State handed to each step of a cycle.
pub struct CycleContext<'a> {
    pub payload: &'a AnalyticsPayload,
    pub trace_id: &'a str,
    pub optimization: &'a mut OptimizationConfig,
}

/// One adaptive sub-loop. Returns `None` when the payload lacks the inputs
/// the step needs.
#[async_trait]
pub trait AdaptiveStep: Send + Sync {
    fn capability(&self) -> AdaptiveCapability;

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>>;
}

/// Promotes a winner for the payload's experiment and archives it.
pub struct ExperimentLifecycleStep {
    manager: Arc<ExperimentLifecycleManager>,
}

impl ExperimentLifecycleStep {
    pub fn new(manager: Arc<ExperimentLifecycleManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl AdaptiveStep for ExperimentLifecycleStep {
    fn capability(&self) -> AdaptiveCapability {
        AdaptiveCapability::ExperimentLifecycle
    }

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>> {
        let Some((experiment_id, variants)) = ctx.payload.experiment_target() else {
            return Ok(None);
        };

        let mut result = self
            .manager
            .promote_winner(
                experiment_id,
                variants,
                ctx.optimization.min_sample_size_for_winner(),
            )
            .await?;

        if result.promoted && result.winner.is_some() {
            result.archived = self
                .manager
                .archive_experiment(experiment_id, ctx.trace_id)
                .await?;
        }

        Ok(Some(StepUpdate::ExperimentLifecycle(LifecycleUpdate {
            experiment_id: experiment_id.to_string(),
            winner: result.winner,
            promoted: result.promoted,
            archived: result.archived,
        })))
    }
}

#[derive(Default)]
pub struct LearningLoopStep {
    updater: LearningLoopUpdater,
}

#[async_trait]
impl AdaptiveStep for LearningLoopStep {
    fn capability(&self) -> AdaptiveCapability {
        AdaptiveCapability::LearningLoop
    }

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>> {
        let update = self.updater.apply(
            &ctx.payload.observed_scores,
            &ctx.payload.predicted_scores,
            ctx.optimization,
        );
        Ok(Some(StepUpdate::LearningLoop(LearningLoopReport {
            update,
            epsilon_exploration: ctx.optimization.epsilon_exploration(),
        })))
    }
}

#[derive(Default)]
pub struct ObjectiveStrategyStep {
    updater: ObjectiveAwareStrategyUpdater,
}

impl ObjectiveStrategyStep {
    pub fn new(updater: ObjectiveAwareStrategyUpdater) -> Self {
        Self { updater }
    }
}

#[async_trait]
impl AdaptiveStep for ObjectiveStrategyStep {
    fn capability(&self) -> AdaptiveCapability {
        AdaptiveCapability::ObjectiveStrategy
    }

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>> {
        let objective = ctx.payload.objective.as_deref().unwrap_or(DEFAULT_OBJECTIVE);
        let update = self
            .updater
            .apply(objective, &ctx.payload.kpi_deltas, ctx.optimization);
        Ok(Some(StepUpdate::ObjectiveStrategy(update)))
    }
}

#[derive(Default)]
pub struct ModeControllerStep {
    controller: ModeController,
}

#[async_trait]
impl AdaptiveStep for ModeControllerStep {
    fn capability(&self) -> AdaptiveCapability {
        AdaptiveCapability::ModeController
    }

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>> {
        let Some(inputs) = ctx.payload.mode_inputs.as_ref() else {
            return Ok(None);
        };
        let decision = self.controller.decide(
            ctx.payload.current_mode.unwrap_or(Mode::Exploit),
            ctx.payload.explore_coef.unwrap_or(DEFAULT_EXPLORE_COEF),
            inputs,
        );
        Ok(Some(StepUpdate::ModeController(decision)))
    }
}

pub struct ShadowTestingStep {
    evaluator: ShadowTestEvaluator,
    min_views: u64,
}

impl ShadowTestingStep {
    pub fn new(min_views: u64) -> Self {
        Self {
            evaluator: ShadowTestEvaluator::new(),
            min_views,
        }
    }
}

impl Default for ShadowTestingStep {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VIEWS)
    }
}

#[async_trait]
impl AdaptiveStep for ShadowTestingStep {
    fn capability(&self) -> AdaptiveCapability {
        AdaptiveCapability::ShadowTesting
    }

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>> {
        let Some(results) = ctx.payload.shadow_test_results.as_deref() else {
            return Ok(None);
        };
        let winner = self.evaluator.evaluate(results, self.min_views);
        Ok(Some(StepUpdate::ShadowTesting(winner)))
    }
}

#[derive(Default)]
pub struct MonetizationAnalyticsStep {
    analyst: MonetizationAnalyst,
}

#[async_trait]
impl AdaptiveStep for MonetizationAnalyticsStep {
    fn capability(&self) -> AdaptiveCapability {
        AdaptiveCapability::MonetizationAnalytics
    }

    async fn run(&self, ctx: &mut CycleContext<'_>) -> DomainResult<Option<StepUpdate>> {
        let Some(metrics) = ctx.payload.monetization_metrics.as_ref() else {
            return Ok(None);
        };
        Ok(Some(StepUpdate::MonetizationAnalytics(
            self.analyst.evaluate(metrics),
        )))
    }
}

/// Integration point for the adaptive loops between analytics and planning.
pub struct AdaptiveCycleCoordinator {
    optimization: SharedOptimization,
    steps: BTreeMap<AdaptiveCapability, Box<dyn AdaptiveStep>>,
    enabled: BTreeSet<AdaptiveCapability>,
    sink: Arc<dyn DecisionSink>,
}

impl AdaptiveCycleCoordinator {
    /// Coordinator with no steps, nothing enabled, and a discarding sink.
    pub fn new(optimization: SharedOptimization) -> Self {
        Self {
            optimization,
            steps: BTreeMap::new(),
            enabled: BTreeSet::new(),
            sink: Arc::new(NullDecisionSink),
        }
    }

    /// Register the standard step for every capability.
    #[must_use]
    pub fn with_default_steps(
        self,
        lifecycle: Arc<ExperimentLifecycleManager>,
        shadow_min_views: u64,
    ) -> Self {
        self.with_step(ExperimentLifecycleStep::new(lifecycle))
            .with_step(LearningLoopStep::default())
            .with_step(ObjectiveStrategyStep::default())
            .with_step(ModeControllerStep::default())
            .with_step(ShadowTestingStep::new(shadow_min_views))
            .with_step(MonetizationAnalyticsStep::default())
    }

    /// Register `step`, replacing any step for the same capability.
    #[must_use]
    pub fn with_step(mut self, step: impl AdaptiveStep + 'static) -> Self {
        self.steps.insert(step.capability(), Box::new(step));
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, capabilities: impl IntoIterator<Item = AdaptiveCapability>) -> Self {
        self.enabled = capabilities.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_decision_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn enabled(&self) -> &BTreeSet<AdaptiveCapability> {
        &self.enabled
    }

    pub fn optimization(&self) -> SharedOptimization {
        Arc::clone(&self.optimization)
    }

    /// Run every enabled step against `payload` and report what changed.
    ///
    /// The decision sink is called once if any step produced an update. A
    /// failing sink is logged and does not fail the cycle.
    pub async fn process_after_analytics(
        &self,
        payload: &AnalyticsPayload,
        trace_id: &str,
    ) -> DomainResult<CycleReport> {
        let mut optimization = self.optimization.lock().await;
        let mut updates = CycleUpdates::new();

        {
            let mut ctx = CycleContext {
                payload,
                trace_id,
                optimization: &mut *optimization,
            };

            for capability in &self.enabled {
                let Some(step) = self.steps.get(capability) else {
                    tracing::warn!(%capability, trace_id, "capability enabled without a registered step");
                    continue;
                };
                if let Some(update) = step.run(&mut ctx).await? {
                    tracing::debug!(%capability, trace_id, "adaptive step produced update");
                    updates.insert(*capability, update);
                }
            }
        }

        let optimization_version = optimization.version();
        drop(optimization);

        if !updates.is_empty() {
            let decision = CycleDecision {
                trace_id: trace_id.to_string(),
                updates: updates.clone(),
            };
            if let Err(e) = self.sink.record(&decision).await {
                tracing::warn!(trace_id, error = %e, "failed to record cycle decision");
            }
        }

        tracing::info!(
            trace_id,
            updates = updates.len(),
            optimization_version,
            "adaptive cycle complete"
        );

        Ok(CycleReport {
            trace_id: trace_id.to_string(),
            optimization_version,
            updates,
        })
    }

    /// Run cycles back to back, pausing `interval` between them, until the
    /// source runs dry or `max_cycles` is reached. Each cycle gets a fresh
    /// trace id.
    pub async fn run_scheduled(
        &self,
        source: &dyn AnalyticsSource,
        interval: Duration,
        max_cycles: Option<usize>,
    ) -> DomainResult<Vec<CycleReport>> {
        let mut reports = Vec::new();
        loop {
            if max_cycles.is_some_and(|max| reports.len() >= max) {
                break;
            }
            let Some(payload) = source.next_payload().await? else {
                break;
            };
            if !reports.is_empty() {
                tokio::time::sleep(interval).await;
            }

            let trace_id = Uuid::new_v4().to_string();
            reports.push(self.process_after_analytics(&payload, &trace_id).await?);
        }

        tracing::info!(cycles = reports.len(), "scheduled adaptive run finished");
        Ok(reports)
    }
}
