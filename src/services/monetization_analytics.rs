//! Growth vs. monetization scoring for recent account performance.

use crate::domain::models::{MonetizationInsight, MonetizationMetrics};
use crate::services::mode_controller::round4;

const GROWTH_SCALE: f64 = 8.0;
const MONETIZATION_SCALE: f64 = 12.0;
const DRIFT_GROWTH_THRESHOLD: f64 = 0.4;

/// Weighting of growth against monetization in the combined objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    pub growth: f64,
    pub monetization: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            growth: 0.65,
            monetization: 0.35,
        }
    }
}

/// Scores growth and buyer intent and flags when growth outpaces intent.
#[derive(Debug, Clone, Copy)]
pub struct MonetizationAnalyst {
    weights: ObjectiveWeights,
    intent_baseline: f64,
}

impl Default for MonetizationAnalyst {
    fn default() -> Self {
        Self::new(ObjectiveWeights::default(), 0.03)
    }
}

impl MonetizationAnalyst {
    pub fn new(weights: ObjectiveWeights, intent_baseline: f64) -> Self {
        Self {
            weights,
            intent_baseline,
        }
    }

    pub fn evaluate(&self, metrics: &MonetizationMetrics) -> MonetizationInsight {
        let views = metrics.views.max(1.0);
        let growth = ((metrics.shares + metrics.saves) / views * GROWTH_SCALE).min(1.0);
        let monetization =
            ((metrics.intent_comments + metrics.profile_actions) / views * MONETIZATION_SCALE)
                .min(1.0);
        let total = self.weights.growth * growth + self.weights.monetization * monetization;
        let drift_flag =
            metrics.intent_comments / views < self.intent_baseline && growth > DRIFT_GROWTH_THRESHOLD;

        if drift_flag {
            tracing::warn!(growth, monetization, "monetization drift: growth without intent");
        }

        MonetizationInsight {
            monetization_score: round4(monetization),
            growth_score: round4(growth),
            total_objective: round4(total),
            drift_flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_account() {
        let insight = MonetizationAnalyst::default().evaluate(&MonetizationMetrics {
            views: 1000.0,
            shares: 20.0,
            saves: 30.0,
            intent_comments: 45.0,
            profile_actions: 18.0,
        });

        assert!((insight.growth_score - 0.4).abs() < 1e-9);
        assert!((insight.monetization_score - 0.756).abs() < 1e-9);
        assert!((insight.total_objective - 0.5246).abs() < 1e-9);
        assert!(!insight.drift_flag);
    }

    #[test]
    fn test_drift_when_growth_outpaces_intent() {
        let insight = MonetizationAnalyst::default().evaluate(&MonetizationMetrics {
            views: 1000.0,
            shares: 60.0,
            saves: 40.0,
            intent_comments: 5.0,
            profile_actions: 0.0,
        });

        assert!((insight.growth_score - 0.8).abs() < 1e-9);
        assert!(insight.drift_flag);
    }

    #[test]
    fn test_scores_are_capped() {
        let insight = MonetizationAnalyst::default().evaluate(&MonetizationMetrics {
            views: 10.0,
            shares: 10.0,
            saves: 10.0,
            intent_comments: 10.0,
            profile_actions: 10.0,
        });
        assert!((insight.growth_score - 1.0).abs() < 1e-9);
        assert!((insight.monetization_score - 1.0).abs() < 1e-9);
        assert!((insight.total_objective - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_views_use_unit_denominator() {
        let insight = MonetizationAnalyst::default().evaluate(&MonetizationMetrics::default());
        assert!((insight.total_objective - 0.0).abs() < f64::EPSILON);
        assert!(!insight.drift_flag);
    }
}
