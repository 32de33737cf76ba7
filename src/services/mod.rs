//! Application services: the optimizer, the adaptive sub-loops, niche
//! strategy, publishing, and the cycle coordinator that ties them together.

pub mod adaptive_cycle;
pub mod experiment_lifecycle;
pub mod experiment_optimizer;
pub mod learning_strategy;
pub mod mode_controller;
pub mod monetization_analytics;
pub mod niche_strategy;
pub mod publisher;
pub mod shadow_testing;

pub use adaptive_cycle::{
    AdaptiveCycleCoordinator, AdaptiveStep, CycleContext, ExperimentLifecycleStep,
    LearningLoopStep, ModeControllerStep, MonetizationAnalyticsStep, ObjectiveStrategyStep,
    ShadowTestingStep,
};
pub use experiment_lifecycle::ExperimentLifecycleManager;
pub use experiment_optimizer::ExperimentOptimizer;
pub use learning_strategy::{LearningLoopUpdater, ObjectiveAwareStrategyUpdater};
pub use mode_controller::ModeController;
pub use monetization_analytics::{MonetizationAnalyst, ObjectiveWeights};
pub use niche_strategy::{NicheStrategyEngine, SuccessScoreWeights};
pub use publisher::ContentPublisher;
pub use shadow_testing::ShadowTestEvaluator;
