//! Contentloop - adaptive content strategy engine
//!
//! Contentloop closes the loop between publishing and planning: post
//! analytics feed epsilon-greedy variant experiments, a mode controller
//! that balances exploration against exploitation, learning and objective
//! updaters that retune the shared optimization settings, shadow-test and
//! monetization evaluators, and a niche ranking engine for new accounts.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors, and ports
//! - **Service Layer** (`services`): The optimizer, adaptive sub-loops, and
//!   the cycle coordinator
//! - **Adapters** (`adapters`): SQLite persistence for arm state and decisions
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use contentloop::domain::models::{AdaptiveCapability, AnalyticsPayload, OptimizationConfig};
//! use contentloop::services::{AdaptiveCycleCoordinator, ExperimentLifecycleManager, ExperimentOptimizer};
//!
//! let lifecycle = Arc::new(ExperimentLifecycleManager::new(Arc::new(RwLock::new(ExperimentOptimizer::new()))));
//! let coordinator = AdaptiveCycleCoordinator::new(OptimizationConfig::default().into_shared())
//!     .with_default_steps(lifecycle, 200)
//!     .with_enabled(AdaptiveCapability::ALL);
//! let report = coordinator.process_after_analytics(&AnalyticsPayload::default(), "trace-1").await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult, PublishError};
pub use domain::models::{
    AdaptiveCapability, AnalyticsPayload, ArmStats, ArmStatsStore, Config, CycleReport, Mode,
    OptimizationConfig, PostMetrics,
};
pub use domain::ports::{AnalyticsSource, ArmStateRepository, DecisionSink, PublishClient};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AdaptiveCycleCoordinator, ContentPublisher, ExperimentLifecycleManager, ExperimentOptimizer,
    NicheStrategyEngine,
};
