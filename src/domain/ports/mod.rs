//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - AnalyticsSource: payloads for scheduled cycles
//! - ArmStateRepository: persisted bandit arm state
//! - DecisionSink: per-cycle decision audit trail
//! - OptimizationStateRepository: learned settings between runs
//! - PublishClient: platform publishing
//!
//! Null implementations cover deployments without storage wiring.

pub mod analytics_source;
pub mod arm_state_repository;
pub mod decision_sink;
pub mod null_arm_state;
pub mod optimization_state_repository;
pub mod publish_client;

pub use analytics_source::{AnalyticsSource, QueuedAnalyticsSource};
pub use arm_state_repository::{ArmStateRecord, ArmStateRepository};
pub use decision_sink::{DecisionSink, NullDecisionSink};
pub use null_arm_state::NullArmStateRepository;
pub use optimization_state_repository::OptimizationStateRepository;
pub use publish_client::PublishClient;
