//! Learned optimization settings survive between separate invocations.

use std::sync::Arc;

use contentloop::cli::commands::AppContext;
use contentloop::domain::models::{AdaptiveCapability, AnalyticsPayload, Config};
use contentloop::services::AdaptiveCycleCoordinator;
use serde_json::json;

fn config_in(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = dir.path().join("contentloop.db").display().to_string();
    config
}

fn learning_payload() -> AnalyticsPayload {
    serde_json::from_value(json!({
        "observed_scores": [0.9, 0.2, 0.7],
        "predicted_scores": [0.5, 0.5, 0.5],
        "objective": "growth",
        "kpi_deltas": {"share_delta": 0.4, "reach_delta": -0.1}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_learned_settings_carry_into_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let ctx = AppContext::open(config.clone()).await.unwrap();
    let coordinator = AdaptiveCycleCoordinator::new(Arc::clone(&ctx.optimization))
        .with_default_steps(Arc::clone(&ctx.lifecycle), 200)
        .with_enabled([AdaptiveCapability::LearningLoop, AdaptiveCapability::ObjectiveStrategy]);
    coordinator
        .process_after_analytics(&learning_payload(), "trace-1")
        .await
        .unwrap();

    assert!(ctx.persist_optimization("trace-1").await.unwrap());
    let learned = ctx.optimization_snapshot().await;
    ctx.pool.close().await;
    drop(ctx);

    let next = AppContext::open(config).await.unwrap();
    let restored = next.optimization_snapshot().await;

    assert!((restored.epsilon_exploration() - 0.25).abs() < 1e-9);
    assert_eq!(restored.version(), 2);
    for (metric, weight) in learned.objective_weights() {
        assert!((restored.weight(metric) - weight).abs() < 1e-12, "{metric}");
    }
    assert!(restored.weight("shares") > 0.25);
    assert!(!next.persist_optimization("trace-2").await.unwrap());
}

#[tokio::test]
async fn test_nothing_saved_without_learning() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let ctx = AppContext::open(config.clone()).await.unwrap();
    assert!(!ctx.persist_optimization("trace-1").await.unwrap());
    ctx.pool.close().await;
    drop(ctx);

    let next = AppContext::open(config).await.unwrap();
    let restored = next.optimization_snapshot().await;
    assert!((restored.epsilon_exploration() - 0.2).abs() < f64::EPSILON);
    assert_eq!(restored.version(), 0);
}

#[tokio::test]
async fn test_configured_threshold_wins_over_saved_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);

    let ctx = AppContext::open(config.clone()).await.unwrap();
    ctx.optimization.lock().await.set_epsilon_exploration(0.3);
    assert!(ctx.persist_optimization("trace-1").await.unwrap());
    ctx.pool.close().await;
    drop(ctx);

    config.optimization.set_min_sample_size_for_winner(3);
    let next = AppContext::open(config).await.unwrap();
    let restored = next.optimization_snapshot().await;
    assert_eq!(restored.min_sample_size_for_winner(), 3);
    assert!((restored.epsilon_exploration() - 0.3).abs() < f64::EPSILON);
    assert_eq!(restored.version(), 1);
}
