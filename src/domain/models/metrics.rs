//! Post-level performance metrics fed back into the optimizer.

use serde::{Deserialize, Serialize};

use super::optimization::OptimizationConfig;

/// Observed performance of one published post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PostMetrics {
    pub brief_id: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub saves: u64,
    #[serde(default)]
    pub avg_watch_time_seconds: f64,
}

impl PostMetrics {
    /// Metric names recognised by [`score`](Self::score), in field order.
    pub const METRIC_NAMES: [&'static str; 6] =
        ["views", "likes", "comments", "shares", "saves", "watch_time"];

    /// Weighted dot product of the six metric fields. Metrics without a
    /// weight contribute nothing.
    pub fn score(&self, optimization: &OptimizationConfig) -> f64 {
        self.views as f64 * optimization.weight("views")
            + self.likes as f64 * optimization.weight("likes")
            + self.comments as f64 * optimization.weight("comments")
            + self.shares as f64 * optimization.weight("shares")
            + self.saves as f64 * optimization.weight("saves")
            + self.avg_watch_time_seconds * optimization.weight("watch_time")
    }
}
