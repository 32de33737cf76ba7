//! Capability tags naming the adaptive sub-loops a cycle may run, and the
//! structured updates those sub-loops report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::mode::ModeDecision;
use super::monetization::MonetizationInsight;
use super::shadow::ShadowWinner;
use crate::domain::errors::DomainError;

/// One adaptive sub-loop. Declaration order is the order a cycle runs them
/// in: the learning and strategy loops adjust the shared optimization
/// settings before the read-only evaluators report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveCapability {
    ExperimentLifecycle,
    LearningLoop,
    ObjectiveStrategy,
    ModeController,
    ShadowTesting,
    MonetizationAnalytics,
}

impl AdaptiveCapability {
    pub const ALL: [Self; 6] = [
        Self::ExperimentLifecycle,
        Self::LearningLoop,
        Self::ObjectiveStrategy,
        Self::ModeController,
        Self::ShadowTesting,
        Self::MonetizationAnalytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExperimentLifecycle => "experiment_lifecycle",
            Self::LearningLoop => "learning_loop",
            Self::ObjectiveStrategy => "objective_strategy",
            Self::ModeController => "mode_controller",
            Self::ShadowTesting => "shadow_testing",
            Self::MonetizationAnalytics => "monetization_analytics",
        }
    }
}

impl fmt::Display for AdaptiveCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdaptiveCapability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownCapability(s.to_string()))
    }
}


/// Lifecycle step output: the promoted winner, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleUpdate {
    pub experiment_id: String,
    pub winner: Option<String>,
    pub promoted: bool,
    pub archived: bool,
}

/// Prediction error statistics from one learning-loop pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningLoopUpdate {
    pub sample_count: usize,
    pub mean_error: f64,
    pub mean_absolute_error: f64,
}

/// Learning-loop step output, including the exploration rate it left behind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningLoopReport {
    #[serde(flatten)]
    pub update: LearningLoopUpdate,
    pub epsilon_exploration: f64,
}

/// Objective weights after a strategy adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyUpdate {
    pub objective: String,
    pub adjusted_weights: BTreeMap<String, f64>,
}

/// Structured output of one adaptive step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepUpdate {
    ExperimentLifecycle(LifecycleUpdate),
    LearningLoop(LearningLoopReport),
    ObjectiveStrategy(StrategyUpdate),
    ModeController(ModeDecision),
    ShadowTesting(ShadowWinner),
    MonetizationAnalytics(MonetizationInsight),
}

/// Step outputs of one cycle keyed by capability.
pub type CycleUpdates = BTreeMap<AdaptiveCapability, StepUpdate>;

/// What the decision sink receives once per productive cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDecision {
    pub trace_id: String,
    pub updates: CycleUpdates,
}

/// Result of one adaptive cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub trace_id: String,
    /// Optimization settings version after the cycle
    pub optimization_version: u64,
    pub updates: CycleUpdates,
}
