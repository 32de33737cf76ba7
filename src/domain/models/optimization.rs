//! Shared optimization settings mutated by the adaptive loops.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle to the optimization settings shared between the optimizer and the
/// adaptive cycle. A cycle holds the lock for its entire update phase.
pub type SharedOptimization = Arc<Mutex<OptimizationConfig>>;

/// Objective weights, exploration rate, and promotion threshold.
///
/// Every setter bumps [`version`](Self::version) so readers can tell which
/// cycle produced the values they observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OptimizationConfig {
    /// Metric name to weight; sums to ~1.0 after each strategy adjustment
    #[serde(default = "default_objective_weights")]
    objective_weights: BTreeMap<String, f64>,

    /// Probability of a uniformly random pick once every arm has been tried
    #[serde(default = "default_epsilon_exploration")]
    epsilon_exploration: f64,

    /// Minimum pulls before a variant can be promoted
    #[serde(default = "default_min_sample_size_for_winner")]
    min_sample_size_for_winner: u64,

    #[serde(skip)]
    version: u64,
}

fn default_objective_weights() -> BTreeMap<String, f64> {
    [
        ("views", 0.10),
        ("likes", 0.15),
        ("comments", 0.20),
        ("shares", 0.25),
        ("saves", 0.25),
        ("watch_time", 0.05),
    ]
    .into_iter()
    .map(|(name, weight)| (name.to_string(), weight))
    .collect()
}

const fn default_epsilon_exploration() -> f64 {
    0.2
}

const fn default_min_sample_size_for_winner() -> u64 {
    20
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            objective_weights: default_objective_weights(),
            epsilon_exploration: default_epsilon_exploration(),
            min_sample_size_for_winner: default_min_sample_size_for_winner(),
            version: 0,
        }
    }
}

impl OptimizationConfig {
    pub fn new(
        objective_weights: BTreeMap<String, f64>,
        epsilon_exploration: f64,
        min_sample_size_for_winner: u64,
    ) -> Self {
        Self {
            objective_weights,
            epsilon_exploration,
            min_sample_size_for_winner,
            version: 0,
        }
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon_exploration: f64) -> Self {
        self.epsilon_exploration = epsilon_exploration;
        self
    }

    #[must_use]
    pub const fn with_min_sample_size(mut self, min_sample_size_for_winner: u64) -> Self {
        self.min_sample_size_for_winner = min_sample_size_for_winner;
        self
    }

    /// Carry over what the adaptive loops learned in an earlier run: objective
    /// weights, exploration rate, and version. The promotion threshold stays
    /// as configured.
    #[must_use]
    pub fn with_learned_state(mut self, learned: &OptimizationConfig) -> Self {
        self.objective_weights = learned.objective_weights.clone();
        self.epsilon_exploration = learned.epsilon_exploration;
        self.version = learned.version;
        self
    }

    /// Restore a persisted version counter.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn into_shared(self) -> SharedOptimization {
        Arc::new(Mutex::new(self))
    }

    pub const fn objective_weights(&self) -> &BTreeMap<String, f64> {
        &self.objective_weights
    }

    /// Weight for `metric`, `0.0` when absent.
    pub fn weight(&self, metric: &str) -> f64 {
        self.objective_weights.get(metric).copied().unwrap_or(0.0)
    }

    pub const fn epsilon_exploration(&self) -> f64 {
        self.epsilon_exploration
    }

    pub const fn min_sample_size_for_winner(&self) -> u64 {
        self.min_sample_size_for_winner
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    pub fn set_epsilon_exploration(&mut self, epsilon_exploration: f64) {
        self.epsilon_exploration = epsilon_exploration;
        self.version += 1;
    }

    /// Replace the objective weights wholesale.
    pub fn set_objective_weights(&mut self, objective_weights: BTreeMap<String, f64>) {
        self.objective_weights = objective_weights;
        self.version += 1;
    }

    pub fn set_min_sample_size_for_winner(&mut self, min_sample_size_for_winner: u64) {
        self.min_sample_size_for_winner = min_sample_size_for_winner;
        self.version += 1;
    }
}
