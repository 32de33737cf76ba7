//! Feedback updaters that tune the shared optimization settings.
//!
//! - [`LearningLoopUpdater`] widens or narrows exploration based on how far
//!   predictions were from observed scores.
//! - [`ObjectiveAwareStrategyUpdater`] nudges objective weights toward the
//!   KPIs that moved in the right direction.

use std::collections::BTreeMap;

use crate::domain::models::{LearningLoopUpdate, OptimizationConfig, StrategyUpdate};

const HIGH_ERROR_MAE: f64 = 0.15;
const LOW_ERROR_MAE: f64 = 0.05;
const EPSILON_RAISE: f64 = 0.05;
const EPSILON_LOWER: f64 = 0.02;
const EPSILON_CEILING: f64 = 0.5;
const EPSILON_FLOOR: f64 = 0.05;

const WEIGHT_FLOOR: f64 = 0.01;
pub const DEFAULT_ADJUSTMENT_STEP: f64 = 0.03;

/// KPI delta name to the objective weight it moves.
const KPI_TO_METRIC: [(&str, &str); 6] = [
    ("reach_delta", "views"),
    ("engagement_delta", "likes"),
    ("conversation_delta", "comments"),
    ("share_delta", "shares"),
    ("save_delta", "saves"),
    ("watch_time_delta", "watch_time"),
];

/// Adjusts `epsilon_exploration` from prediction error.
#[derive(Debug, Clone, Copy, Default)]
pub struct LearningLoopUpdater;

impl LearningLoopUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Compare paired observed/predicted scores, truncated to the shorter
    /// list. With no pairs nothing is mutated.
    pub fn apply(
        &self,
        observed: &[f64],
        predicted: &[f64],
        optimization: &mut OptimizationConfig,
    ) -> LearningLoopUpdate {
        let sample_count = observed.len().min(predicted.len());
        if sample_count == 0 {
            return LearningLoopUpdate::default();
        }

        let errors: Vec<f64> = observed
            .iter()
            .zip(predicted)
            .map(|(obs, pred)| obs - pred)
            .collect();
        let n = sample_count as f64;
        let mean_error = errors.iter().sum::<f64>() / n;
        let mean_absolute_error = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let epsilon = optimization.epsilon_exploration();
        if mean_absolute_error > HIGH_ERROR_MAE {
            optimization.set_epsilon_exploration((epsilon + EPSILON_RAISE).min(EPSILON_CEILING));
        } else if mean_absolute_error < LOW_ERROR_MAE {
            optimization.set_epsilon_exploration((epsilon - EPSILON_LOWER).max(EPSILON_FLOOR));
        }

        tracing::debug!(
            sample_count,
            mean_absolute_error,
            epsilon_before = epsilon,
            epsilon_after = optimization.epsilon_exploration(),
            "learning loop applied"
        );

        LearningLoopUpdate {
            sample_count,
            mean_error,
            mean_absolute_error,
        }
    }
}

/// Shifts objective weights in the direction of KPI deltas and renormalizes.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveAwareStrategyUpdater {
    adjustment_step: f64,
}

impl Default for ObjectiveAwareStrategyUpdater {
    fn default() -> Self {
        Self::new(DEFAULT_ADJUSTMENT_STEP)
    }
}

impl ObjectiveAwareStrategyUpdater {
    pub fn new(adjustment_step: f64) -> Self {
        Self { adjustment_step }
    }

    pub fn apply(
        &self,
        objective: &str,
        kpi_deltas: &BTreeMap<String, f64>,
        optimization: &mut OptimizationConfig,
    ) -> StrategyUpdate {
        let mut weights = optimization.objective_weights().clone();

        for (kpi, delta) in kpi_deltas {
            let Some(metric) = KPI_TO_METRIC
                .iter()
                .find(|(name, _)| name == kpi)
                .map(|(_, metric)| *metric)
            else {
                continue;
            };
            let step = if *delta >= 0.0 {
                self.adjustment_step
            } else {
                -self.adjustment_step
            };
            let current = weights.get(metric).copied().unwrap_or(WEIGHT_FLOOR);
            weights.insert(metric.to_string(), (current + step).max(WEIGHT_FLOOR));
        }

        let total: f64 = weights.values().sum();
        if total > 0.0 {
            for weight in weights.values_mut() {
                *weight /= total;
            }
        }

        optimization.set_objective_weights(weights.clone());
        tracing::debug!(objective, deltas = kpi_deltas.len(), "objective weights adjusted");

        StrategyUpdate {
            objective: objective.to_string(),
            adjusted_weights: weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scores_leave_epsilon_alone() {
        let mut config = OptimizationConfig::default();
        let update = LearningLoopUpdater::new().apply(&[], &[0.5], &mut config);

        assert_eq!(update, LearningLoopUpdate::default());
        assert_eq!(config.version(), 0);
        assert!((config.epsilon_exploration() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_high_error_raises_epsilon() {
        let mut config = OptimizationConfig::default();
        let update = LearningLoopUpdater::new().apply(&[0.9, 0.1], &[0.5, 0.5], &mut config);

        assert_eq!(update.sample_count, 2);
        assert!((update.mean_absolute_error - 0.4).abs() < 1e-9);
        assert!((update.mean_error - 0.0).abs() < 1e-9);
        assert!((config.epsilon_exploration() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_epsilon_capped() {
        let mut config = OptimizationConfig::default().with_epsilon(0.48);
        LearningLoopUpdater::new().apply(&[1.0], &[0.0], &mut config);
        assert!((config.epsilon_exploration() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_low_error_lowers_epsilon_with_floor() {
        let mut config = OptimizationConfig::default().with_epsilon(0.06);
        LearningLoopUpdater::new().apply(&[0.5, 0.5, 0.5], &[0.5, 0.51, 0.49, 0.1], &mut config);
        assert!((config.epsilon_exploration() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_moderate_error_keeps_epsilon() {
        let mut config = OptimizationConfig::default();
        LearningLoopUpdater::new().apply(&[0.6], &[0.5], &mut config);
        assert!((config.epsilon_exploration() - 0.2).abs() < 1e-9);
        assert_eq!(config.version(), 0);
    }

    #[test]
    fn test_strategy_moves_weights_and_renormalizes() {
        let mut config = OptimizationConfig::default();
        let deltas = BTreeMap::from([
            ("share_delta".to_string(), 0.3),
            ("reach_delta".to_string(), -0.1),
            ("unknown_delta".to_string(), 5.0),
        ]);

        let update = ObjectiveAwareStrategyUpdater::default().apply("growth", &deltas, &mut config);

        let total: f64 = update.adjusted_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((update.adjusted_weights["shares"] - 0.28).abs() < 1e-9);
        assert!((update.adjusted_weights["views"] - 0.07).abs() < 1e-9);
        assert_eq!(update.adjusted_weights.len(), 6);
        assert_eq!(config.objective_weights(), &update.adjusted_weights);
        assert_eq!(update.objective, "growth");
    }

    #[test]
    fn test_strategy_floors_weights() {
        let mut config = OptimizationConfig::new(
            BTreeMap::from([("views".to_string(), 0.02), ("saves".to_string(), 0.98)]),
            0.2,
            20,
        );
        let deltas = BTreeMap::from([("reach_delta".to_string(), -1.0)]);

        let update = ObjectiveAwareStrategyUpdater::default().apply("engagement", &deltas, &mut config);

        // views floored at 0.01 then renormalized with saves 0.98
        assert!((update.adjusted_weights["views"] - 0.01 / 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_missing_weight_starts_at_floor() {
        let mut config = OptimizationConfig::new(BTreeMap::new(), 0.2, 20);
        let deltas = BTreeMap::from([("save_delta".to_string(), 0.5)]);

        let update = ObjectiveAwareStrategyUpdater::default().apply("engagement", &deltas, &mut config);

        assert_eq!(update.adjusted_weights.len(), 1);
        assert!((update.adjusted_weights["saves"] - 1.0).abs() < 1e-9);
    }
}
