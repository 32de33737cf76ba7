//! Shadow-test inputs and rankings.

use serde::{Deserialize, Serialize};

/// Observed performance of one variant in a shadow test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowVariantResult {
    pub variant_id: String,
    pub views: u64,
    pub saves: u64,
    pub shares: u64,
    pub comments: u64,
    pub confidence: f64,
}

/// A variant's position in a shadow-test ranking. Metrics are rounded to
/// four decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVariant {
    pub variant_id: String,
    pub views: u64,
    pub primary_metric: f64,
    pub secondary_metric: f64,
    pub weighted_score: f64,
    pub confidence: f64,
}

/// Outcome of a shadow-test evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowWinner {
    pub winner_variant_id: Option<String>,
    pub ranked: Vec<RankedVariant>,
    pub deferred: bool,
}
