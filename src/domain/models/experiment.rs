//! Experiment lifecycle results.

use serde::{Deserialize, Serialize};

/// Outcome of a winner-promotion decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleResult {
    pub winner: Option<String>,
    pub promoted: bool,
    pub archived: bool,
}

impl LifecycleResult {
    /// No variant met the sample-size threshold.
    pub const fn no_winner() -> Self {
        Self {
            winner: None,
            promoted: false,
            archived: false,
        }
    }
}
