//! Bandit arm statistics and the keyed store that backs the optimizer.
//!
//! Arm keys are opaque to the store. Callers that need namespaces compose
//! them with [`ArmKey`]; persisted records can be classified afterwards with
//! [`ArmRecordKind`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pull count and accumulated reward for one arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub pulls: u64,
    pub reward_sum: f64,
}

impl ArmStats {
    pub const fn new(pulls: u64, reward_sum: f64) -> Self {
        Self { pulls, reward_sum }
    }

    /// Mean reward per pull, `0.0` for an arm that was never pulled.
    pub fn avg_reward(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.reward_sum / self.pulls as f64
        }
    }

    pub const fn is_unseen(&self) -> bool {
        self.pulls == 0
    }

    fn record(&mut self, reward: f64) {
        self.pulls += 1;
        self.reward_sum += reward;
    }
}

/// In-memory mapping of arm key to [`ArmStats`].
///
/// Entries appear lazily: reading an unknown key yields zeroed stats without
/// inserting anything, and the first [`record`](Self::record) creates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArmStatsStore {
    arms: BTreeMap<String, ArmStats>,
}

impl ArmStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats for `arm_key`, zeroed if the arm was never referenced.
    pub fn get(&self, arm_key: &str) -> ArmStats {
        self.arms.get(arm_key).copied().unwrap_or_default()
    }

    pub fn contains(&self, arm_key: &str) -> bool {
        self.arms.contains_key(arm_key)
    }

    /// Add one pull with the given reward to `arm_key`.
    pub fn record(&mut self, arm_key: &str, reward: f64) -> ArmStats {
        let stats = self.arms.entry(arm_key.to_string()).or_default();
        stats.record(reward);
        *stats
    }

    /// Copy of every tracked arm.
    pub fn export(&self) -> BTreeMap<String, ArmStats> {
        self.arms.clone()
    }

    /// Overwrite matching keys with the supplied stats; other keys are left
    /// untouched. Applying the same mapping twice is a no-op.
    pub fn import<I>(&mut self, arm_state: I)
    where
        I: IntoIterator<Item = (String, ArmStats)>,
    {
        for (arm_key, stats) in arm_state {
            self.arms.insert(arm_key, stats);
        }
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

/// Builders and parsers for the arm key namespaces used by experiments.
pub struct ArmKey;

impl ArmKey {
    pub const SEPARATOR: &'static str = "::";

    /// `exp::{experiment_id}::{variant}`
    pub fn experiment(experiment_id: &str, variant: &str) -> String {
        format!("exp::{experiment_id}::{variant}")
    }

    /// `winner::{experiment_id}::{variant}`
    pub fn winner(experiment_id: &str, variant: &str) -> String {
        format!("winner::{experiment_id}::{variant}")
    }

    /// `archive::{experiment_id}`
    pub fn archive(experiment_id: &str) -> String {
        format!("archive::{experiment_id}")
    }

    /// Last `::`-separated segment of a key, which is the variant name for
    /// experiment and winner keys.
    pub fn variant(arm_key: &str) -> &str {
        arm_key
            .rsplit(Self::SEPARATOR)
            .next()
            .unwrap_or(arm_key)
    }
}

/// Classification of a persisted arm-state record by its key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmRecordKind {
    /// Live bandit arm (`exp::`).
    Arm,
    /// Promotion marker (`winner::`); `reward_sum` holds the winner's average.
    Winner,
    /// Archival marker (`archive::`).
    Archive,
    /// Key outside the experiment namespaces.
    Other,
}

impl ArmRecordKind {
    pub fn of(arm_key: &str) -> Self {
        if arm_key.starts_with("exp::") {
            Self::Arm
        } else if arm_key.starts_with("winner::") {
            Self::Winner
        } else if arm_key.starts_with("archive::") {
            Self::Archive
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Winner => "winner",
            Self::Archive => "archive",
            Self::Other => "other",
        }
    }
}
