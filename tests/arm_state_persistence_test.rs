//! Arm state survives restarts through the SQLite repository, and the
//! experiment lifecycle writes its markers there.

mod common;

use std::sync::Arc;

use common::{post, setup_test_db, sqlite_lifecycle};
use contentloop::adapters::sqlite::SqliteArmStateRepository;
use contentloop::domain::models::{ArmKey, ArmRecordKind, OptimizationConfig};
use contentloop::domain::ports::{ArmStateRecord, ArmStateRepository, NullArmStateRepository};
use contentloop::services::{ExperimentLifecycleManager, ExperimentOptimizer};
use tokio::sync::RwLock;

fn variants(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

#[tokio::test]
async fn test_checkpoint_then_hydrate_restores_exact_stats() {
    let pool = setup_test_db().await;
    let optimization = OptimizationConfig::default();

    let first = sqlite_lifecycle(&pool, 1);
    first.register_outcome("exp-1", "a", &post(4, 0), &optimization).await;
    first.register_outcome("exp-1", "a", &post(0, 4), &optimization).await;
    first.register_outcome("exp-1", "b", &post(1, 1), &optimization).await;
    let written = first.checkpoint("trace-1").await.unwrap();
    assert_eq!(written, 2);

    let restarted = sqlite_lifecycle(&pool, 2);
    assert_eq!(restarted.hydrate().await.unwrap(), 2);

    let before = first.optimizer().read().await.export_arm_state();
    let after = restarted.optimizer().read().await.export_arm_state();
    assert_eq!(before, after);

    let a = after[&ArmKey::experiment("exp-1", "a")];
    assert_eq!(a.pulls, 2);
    assert!((a.reward_sum - 2.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_upsert_is_last_writer_wins() {
    let pool = setup_test_db().await;
    let repo = SqliteArmStateRepository::new(pool);
    let key = ArmKey::experiment("exp-1", "a");

    let first = repo.build_arm_state_record(&key, 1, 0.5, "1.0", "t1");
    repo.upsert_arm_states(&[first], "1.0", "t1").await.unwrap();
    let second = repo.build_arm_state_record(&key, 3, 2.5, "1.1", "t2");
    repo.upsert_arm_states(&[second], "1.1", "t2").await.unwrap();

    let records = repo.load_arm_states().await.unwrap();
    assert_eq!(
        records,
        vec![ArmStateRecord {
            arm_key: key,
            pulls: 3,
            reward_sum: 2.5,
            schema_version: "1.1".to_string(),
            trace_id: "t2".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_promote_and_archive_write_markers() {
    let pool = setup_test_db().await;
    let optimization = OptimizationConfig::default();
    let lifecycle = sqlite_lifecycle(&pool, 7);

    for _ in 0..3 {
        lifecycle.register_outcome("exp-1", "a", &post(2, 0), &optimization).await;
        lifecycle.register_outcome("exp-1", "b", &post(4, 4), &optimization).await;
    }

    let result = lifecycle
        .promote_winner("exp-1", &variants(&["a", "b"]), 3)
        .await
        .unwrap();
    assert_eq!(result.winner.as_deref(), Some("b"));
    assert!(result.promoted);
    lifecycle.archive_experiment("exp-1", "trace-archive").await.unwrap();

    let repo = SqliteArmStateRepository::new(pool);
    let records = repo.load_arm_states().await.unwrap();

    let winner = records
        .iter()
        .find(|r| r.kind() == ArmRecordKind::Winner)
        .expect("winner marker");
    assert_eq!(winner.arm_key, ArmKey::winner("exp-1", "b"));
    assert_eq!(winner.pulls, 3);
    assert!((winner.reward_sum - 2.0).abs() < 1e-12);
    assert_eq!(winner.trace_id, "system");

    let archive = records
        .iter()
        .find(|r| r.kind() == ArmRecordKind::Archive)
        .expect("archive marker");
    assert_eq!(archive.arm_key, ArmKey::archive("exp-1"));
    assert_eq!(archive.pulls, 1);
    assert_eq!(archive.trace_id, "trace-archive");
}

#[tokio::test]
async fn test_no_winner_below_sample_threshold_writes_nothing() {
    let pool = setup_test_db().await;
    let optimization = OptimizationConfig::default();
    let lifecycle = sqlite_lifecycle(&pool, 3);
    lifecycle.register_outcome("exp-1", "a", &post(9, 9), &optimization).await;

    let result = lifecycle
        .promote_winner("exp-1", &variants(&["a", "b"]), 20)
        .await
        .unwrap();
    assert!(result.winner.is_none());
    assert!(!result.promoted);

    let repo = SqliteArmStateRepository::new(pool);
    assert!(repo.load_arm_states().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_null_repository_needs_no_database() {
    let lifecycle = ExperimentLifecycleManager::new(Arc::new(RwLock::new(ExperimentOptimizer::with_seed(5))))
        .with_repository(Arc::new(NullArmStateRepository));
    let optimization = OptimizationConfig::default();
    lifecycle.register_outcome("exp-1", "a", &post(1, 0), &optimization).await;

    assert_eq!(lifecycle.hydrate().await.unwrap(), 0);
    assert_eq!(lifecycle.checkpoint("trace").await.unwrap(), 0);
    assert!(!lifecycle.archive_experiment("exp-1", "trace").await.unwrap());
}

#[tokio::test]
async fn test_assignment_after_hydrate_exploits_best_arm() {
    let pool = setup_test_db().await;
    let greedy = OptimizationConfig::default().with_epsilon(0.0);

    let first = sqlite_lifecycle(&pool, 11);
    first.register_outcome("exp-1", "a", &post(1, 0), &greedy).await;
    first.register_outcome("exp-1", "b", &post(8, 8), &greedy).await;
    first.checkpoint("trace-1").await.unwrap();

    let restarted = sqlite_lifecycle(&pool, 12);
    restarted.hydrate().await.unwrap();
    for _ in 0..5 {
        let variant = restarted
            .assign_variant("exp-1", &variants(&["a", "b"]), &greedy)
            .await
            .unwrap();
        assert_eq!(variant, "b");
    }
}
