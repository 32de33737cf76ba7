//! Epsilon-greedy archetype optimizer.
//!
//! Selection order:
//! 1. Cold start: any candidate with zero pulls is picked uniformly at random
//! 2. Exploration: with probability `epsilon_exploration` a uniform pick
//! 3. Exploitation: the highest average reward, first maximum on ties
//!
//! The RNG is seedable so selection can be reproduced in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArmStats, ArmStatsStore, OptimizationConfig, PostMetrics};

/// Multi-armed bandit over opaque arm keys.
#[derive(Debug)]
pub struct ExperimentOptimizer {
    store: ArmStatsStore,
    rng: StdRng,
}

impl Default for ExperimentOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentOptimizer {
    /// Create an optimizer seeded from the operating system.
    pub fn new() -> Self {
        Self {
            store: ArmStatsStore::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create an optimizer with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            store: ArmStatsStore::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose one of `candidates`.
    ///
    /// Fails with [`DomainError::EmptyCandidates`] when nothing is offered.
    pub fn choose_archetype(
        &mut self,
        candidates: &[String],
        optimization: &OptimizationConfig,
    ) -> DomainResult<String> {
        if candidates.is_empty() {
            return Err(DomainError::EmptyCandidates);
        }

        let unseen: Vec<&String> = candidates
            .iter()
            .filter(|arm| self.store.get(arm).is_unseen())
            .collect();
        if !unseen.is_empty() {
            let idx = self.rng.random_range(0..unseen.len());
            tracing::debug!(arm = %unseen[idx], unseen = unseen.len(), "cold start pick");
            return Ok(unseen[idx].clone());
        }

        let roll: f64 = self.rng.random();
        if roll < optimization.epsilon_exploration() {
            let idx = self.rng.random_range(0..candidates.len());
            tracing::debug!(arm = %candidates[idx], "exploration pick");
            return Ok(candidates[idx].clone());
        }

        let mut best = &candidates[0];
        let mut best_reward = self.store.get(best).avg_reward();
        for arm in &candidates[1..] {
            let reward = self.store.get(arm).avg_reward();
            if reward > best_reward {
                best = arm;
                best_reward = reward;
            }
        }
        tracing::debug!(arm = %best, avg_reward = best_reward, "exploitation pick");
        Ok(best.clone())
    }

    /// Score `metrics` under the current objective weights, record it as one
    /// pull of `arm_key`, and return the reward.
    pub fn register_result(
        &mut self,
        arm_key: &str,
        metrics: &PostMetrics,
        optimization: &OptimizationConfig,
    ) -> f64 {
        let reward = metrics.score(optimization);
        self.store.record(arm_key, reward);
        reward
    }

    pub fn stats(&self, arm_key: &str) -> ArmStats {
        self.store.get(arm_key)
    }

    pub fn export_arm_state(&self) -> BTreeMap<String, ArmStats> {
        self.store.export()
    }

    pub fn import_arm_state<I>(&mut self, arm_state: I)
    where
        I: IntoIterator<Item = (String, ArmStats)>,
    {
        self.store.import(arm_state);
    }
}
