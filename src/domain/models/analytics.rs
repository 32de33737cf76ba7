//! Analytics payload handed to the adaptive cycle after each collection run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mode::{Mode, ModeInputs};
use super::monetization::MonetizationMetrics;
use super::shadow::ShadowVariantResult;

/// Experiment reference carried in an analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRef {
    #[serde(default)]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub variants: Vec<String>,
}

/// Signals gathered for one cycle. Every key is optional; steps whose
/// inputs are absent are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPayload {
    #[serde(default)]
    pub experiment: Option<ExperimentRef>,
    #[serde(default)]
    pub observed_scores: Vec<f64>,
    #[serde(default)]
    pub predicted_scores: Vec<f64>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub kpi_deltas: BTreeMap<String, f64>,
    #[serde(default)]
    pub mode_inputs: Option<ModeInputs>,
    #[serde(default)]
    pub current_mode: Option<Mode>,
    #[serde(default)]
    pub explore_coef: Option<f64>,
    #[serde(default)]
    pub shadow_test_results: Option<Vec<ShadowVariantResult>>,
    #[serde(default)]
    pub monetization_metrics: Option<MonetizationMetrics>,
}

impl AnalyticsPayload {
    /// Experiment id and variants, if both are present and non-empty.
    pub fn experiment_target(&self) -> Option<(&str, &[String])> {
        let experiment = self.experiment.as_ref()?;
        let experiment_id = experiment.experiment_id.as_deref()?;
        if experiment_id.is_empty() || experiment.variants.is_empty() {
            return None;
        }
        Some((experiment_id, experiment.variants.as_slice()))
    }
}
