//! Shadow-test evaluation of creative variants shown to a small audience.

use crate::domain::models::{RankedVariant, ShadowVariantResult, ShadowWinner};
use crate::services::mode_controller::round4;

pub const DEFAULT_MIN_VIEWS: u64 = 200;
const MIN_CONFIDENCE: f64 = 0.65;
const PRIMARY_WEIGHT: f64 = 0.8;
const SECONDARY_WEIGHT: f64 = 0.2;

/// Ranks shadow-test variants and decides whether a winner can be declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowTestEvaluator;

impl ShadowTestEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Rank by weighted score, descending and stable. The decision is
    /// deferred when the top variant has too few views or low confidence.
    pub fn evaluate(&self, results: &[ShadowVariantResult], min_views: u64) -> ShadowWinner {
        if results.is_empty() {
            return ShadowWinner {
                winner_variant_id: None,
                ranked: Vec::new(),
                deferred: true,
            };
        }

        let mut ranked: Vec<RankedVariant> = results.iter().map(Self::rank).collect();
        ranked.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));

        let top = &ranked[0];
        let deferred = top.views < min_views || top.confidence < MIN_CONFIDENCE;
        let winner_variant_id = (!deferred).then(|| top.variant_id.clone());

        tracing::debug!(
            variants = ranked.len(),
            top = %top.variant_id,
            deferred,
            "shadow test evaluated"
        );

        ShadowWinner {
            winner_variant_id,
            ranked,
            deferred,
        }
    }

    fn rank(result: &ShadowVariantResult) -> RankedVariant {
        let views = result.views.max(1) as f64;
        let primary = (result.saves + result.shares) as f64 / views;
        let secondary = result.comments as f64 / views;
        RankedVariant {
            variant_id: result.variant_id.clone(),
            views: result.views,
            primary_metric: round4(primary),
            secondary_metric: round4(secondary),
            weighted_score: round4(primary * PRIMARY_WEIGHT + secondary * SECONDARY_WEIGHT),
            confidence: result.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, views: u64, saves: u64, shares: u64, confidence: f64) -> ShadowVariantResult {
        ShadowVariantResult {
            variant_id: id.to_string(),
            views,
            saves,
            shares,
            comments: 3,
            confidence,
        }
    }

    #[test]
    fn test_empty_results_are_deferred() {
        let winner = ShadowTestEvaluator::new().evaluate(&[], DEFAULT_MIN_VIEWS);
        assert!(winner.deferred);
        assert!(winner.winner_variant_id.is_none());
        assert!(winner.ranked.is_empty());
    }

    #[test]
    fn test_low_views_defer_even_with_best_score() {
        let results = vec![variant("a", 100, 20, 10, 0.9), variant("b", 500, 5, 5, 0.9)];
        let winner = ShadowTestEvaluator::new().evaluate(&results, DEFAULT_MIN_VIEWS);

        assert_eq!(winner.ranked[0].variant_id, "a");
        assert!(winner.deferred);
        assert!(winner.winner_variant_id.is_none());
    }

    #[test]
    fn test_low_confidence_defers() {
        let results = vec![variant("a", 1000, 50, 50, 0.5)];
        let winner = ShadowTestEvaluator::new().evaluate(&results, DEFAULT_MIN_VIEWS);
        assert!(winner.deferred);
    }

    #[test]
    fn test_winner_declared() {
        let results = vec![variant("a", 300, 12, 8, 0.82), variant("b", 300, 6, 4, 0.9)];
        let winner = ShadowTestEvaluator::new().evaluate(&results, DEFAULT_MIN_VIEWS);

        assert_eq!(winner.winner_variant_id.as_deref(), Some("a"));
        assert!(!winner.deferred);
        let top = &winner.ranked[0];
        assert!((top.primary_metric - 0.0667).abs() < 1e-9);
        assert!((top.secondary_metric - 0.01).abs() < 1e-9);
        assert!((top.weighted_score - 0.0553).abs() < 1e-9);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let results = vec![variant("first", 400, 10, 10, 0.9), variant("second", 400, 10, 10, 0.9)];
        let winner = ShadowTestEvaluator::new().evaluate(&results, DEFAULT_MIN_VIEWS);
        assert_eq!(winner.winner_variant_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_zero_views_do_not_divide_by_zero() {
        let results = vec![variant("a", 0, 1, 1, 0.9)];
        let winner = ShadowTestEvaluator::new().evaluate(&results, 0);
        assert!((winner.ranked[0].primary_metric - 2.0).abs() < 1e-9);
    }
}
