//! Monetization inputs and the insight derived from them.

use serde::{Deserialize, Serialize};

/// Raw counts used to judge growth against monetization intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonetizationMetrics {
    #[serde(default)]
    pub views: f64,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub saves: f64,
    #[serde(default)]
    pub intent_comments: f64,
    #[serde(default)]
    pub profile_actions: f64,
}

/// Growth and monetization scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonetizationInsight {
    pub monetization_score: f64,
    pub growth_score: f64,
    pub total_objective: f64,
    /// Growth is healthy while purchase intent lags the baseline
    pub drift_flag: bool,
}
