pub mod adaptive;
pub mod analytics;
pub mod arm_stats;
pub mod config;
pub mod experiment;
pub mod metrics;
pub mod mode;
pub mod monetization;
pub mod niche;
pub mod optimization;
pub mod publish;
pub mod shadow;

pub use adaptive::{
    AdaptiveCapability, CycleDecision, CycleReport, CycleUpdates, LearningLoopReport,
    LearningLoopUpdate, LifecycleUpdate, StepUpdate, StrategyUpdate,
};
pub use analytics::{AnalyticsPayload, ExperimentRef};
pub use arm_stats::{ArmKey, ArmRecordKind, ArmStats, ArmStatsStore};
pub use config::{AdaptiveConfig, Config, DatabaseConfig, LoggingConfig, PublisherConfig};
pub use experiment::LifecycleResult;
pub use metrics::PostMetrics;
pub use mode::{Mode, ModeDecision, ModeInputs};
pub use monetization::{MonetizationInsight, MonetizationMetrics};
pub use niche::{
    DecisionReport, EvaluationSummary, ExperimentOutcome, ExperimentPlan, ModelStatus,
    NicheCandidate, NicheEvaluation, NicheScoreBreakdown, NicheSignalMap, NicheSignals,
    PostingPlan,
};
pub use optimization::{OptimizationConfig, SharedOptimization};
pub use publish::{AuditEntry, PublishRequest, PublishResult, PublishStatus};
pub use shadow::{RankedVariant, ShadowVariantResult, ShadowWinner};
