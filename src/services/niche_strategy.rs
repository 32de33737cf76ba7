//! Niche ranking and portfolio experimentation.
//!
//! The engine is deterministic: candidate generation and signal collection
//! are heuristic stand-ins for trend research, and scoring is a weighted sum
//! over normalized signals. Portfolio results feed back through
//! [`NicheStrategyEngine::evaluate_results`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    DecisionReport, EvaluationSummary, ExperimentOutcome, ExperimentPlan, ModelStatus,
    NicheCandidate, NicheEvaluation, NicheScoreBreakdown, NicheSignalMap, NicheSignals,
    PostingPlan,
};
use crate::services::mode_controller::round4;

pub const DEFAULT_VARIANTS_PER_SEED: usize = 4;
pub const DEFAULT_PORTFOLIO_SIZE: usize = 5;

const MODEL_VERSION: &str = "rules-v1";
const PLANNED_POSTS: u32 = 12;
const CADENCE_PER_WEEK: u32 = 5;
const HANDLE_SLUG_CHARS: usize = 18;

const HIGH_SATURATION: f64 = 0.65;
const COMPLIANCE_EXPOSURE: f64 = 0.4;
const ASSET_DEPENDENCY: f64 = 0.5;

/// Weights of the niche success score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessScoreWeights {
    pub demand: f64,
    pub low_saturation: f64,
    pub feasibility: f64,
    pub differentiation_space: f64,
    pub monetization: f64,
}

impl Default for SuccessScoreWeights {
    fn default() -> Self {
        Self {
            demand: 0.25,
            low_saturation: 0.20,
            feasibility: 0.20,
            differentiation_space: 0.15,
            monetization: 0.20,
        }
    }
}

/// Ranks niche candidates and produces an auditable experiment portfolio.
#[derive(Debug, Clone, Default)]
pub struct NicheStrategyEngine {
    weights: SuccessScoreWeights,
}

impl NicheStrategyEngine {
    pub fn new(weights: SuccessScoreWeights) -> Self {
        Self { weights }
    }

    pub const fn weights(&self) -> &SuccessScoreWeights {
        &self.weights
    }

    /// Expand each seed category into `variants_per_seed` angle candidates.
    pub fn generate_candidates(
        &self,
        seed_categories: &[String],
        constraints: &BTreeMap<String, serde_json::Value>,
        variants_per_seed: usize,
    ) -> DomainResult<Vec<NicheCandidate>> {
        let constraint_text = if constraints.is_empty() {
            "none".to_string()
        } else {
            serde_json::to_string(constraints)?
        };

        let mut candidates = Vec::with_capacity(seed_categories.len() * variants_per_seed);
        for seed in seed_categories {
            let seed = seed.trim();
            if seed.is_empty() {
                return Err(DomainError::InvalidInput(
                    "seed category must not be blank".to_string(),
                ));
            }
            for idx in 1..=variants_per_seed {
                candidates.push(NicheCandidate {
                    niche_name: format!("{seed} - angle {idx}"),
                    target_audience: format!("{seed} practitioners seeking fast wins"),
                    content_formats: vec![
                        "short reel".to_string(),
                        "carousel".to_string(),
                        "story Q&A".to_string(),
                    ],
                    unique_angle: format!(
                        "Evidence-backed {seed} workflows under constraints: {constraint_text}"
                    ),
                    example_post_ideas: (1..=10).map(|i| format!("{seed} teardown #{i}")).collect(),
                    creator_persona_tone: "operator-led, practical, no-hype".to_string(),
                    production_requirements: vec![
                        "screen recording".to_string(),
                        "caption templates".to_string(),
                        "weekly trend scan".to_string(),
                    ],
                    monetization_routes: vec![
                        "affiliate".to_string(),
                        "templates".to_string(),
                        "sponsorship".to_string(),
                        "micro-course".to_string(),
                    ],
                });
            }
        }

        tracing::debug!(count = candidates.len(), "generated niche candidates");
        Ok(candidates)
    }

    /// Heuristic market signals derived from the candidate itself.
    pub fn collect_signals(&self, candidates: &[NicheCandidate]) -> NicheSignalMap {
        candidates
            .iter()
            .map(|candidate| {
                let basis = candidate.niche_name.chars().count().max(1);
                let feasibility = if candidate.production_requirements.len() <= 4 {
                    0.7
                } else {
                    0.5
                };
                let signals = NicheSignals {
                    demand: (0.45 + (basis % 11) as f64 / 20.0).min(1.0),
                    saturation: (0.25 + (basis % 9) as f64 / 12.0).min(1.0),
                    differentiation_space: (0.3 + (basis % 7) as f64 / 10.0).min(1.0),
                    feasibility,
                    monetization: 0.6
                        + (candidate.monetization_routes.len() as f64 * 0.05).min(0.35),
                    production_complexity: 0.35,
                    compliance_risk: 0.2,
                    asset_dependency: 0.25,
                };
                (candidate.niche_name.clone(), signals)
            })
            .collect()
    }

    /// Score and rank candidates, best first. Every candidate must have
    /// signals.
    pub fn score_candidates(
        &self,
        candidates: &[NicheCandidate],
        signals: &NicheSignalMap,
    ) -> DomainResult<Vec<NicheScoreBreakdown>> {
        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let signal = signals
                .get(&candidate.niche_name)
                .ok_or_else(|| DomainError::MissingSignals(candidate.niche_name.clone()))?;
            scored.push(self.score(&candidate.niche_name, signal));
        }

        scored.sort_by(|a, b| b.success_score.total_cmp(&a.success_score));
        Ok(scored)
    }

    fn score(&self, niche_name: &str, signal: &NicheSignals) -> NicheScoreBreakdown {
        let w = &self.weights;
        let low_saturation = 1.0 - signal.saturation;
        let success_score = w.demand * signal.demand
            + w.low_saturation * low_saturation
            + w.feasibility * signal.feasibility
            + w.differentiation_space * signal.differentiation_space
            + w.monetization * signal.monetization;

        let mut top_risks = Vec::new();
        if signal.saturation > HIGH_SATURATION {
            top_risks.push("high_saturation".to_string());
        }
        if signal.compliance_risk > COMPLIANCE_EXPOSURE {
            top_risks.push("compliance_exposure".to_string());
        }
        if signal.asset_dependency > ASSET_DEPENDENCY {
            top_risks.push("asset_dependency".to_string());
        }

        NicheScoreBreakdown {
            niche_name: niche_name.to_string(),
            demand: signal.demand,
            low_saturation,
            feasibility: signal.feasibility,
            differentiation_space: signal.differentiation_space,
            monetization: signal.monetization,
            success_score: round4(success_score),
            top_risks,
        }
    }

    /// One pilot account plan for each of the `top_k` best niches.
    pub fn select_portfolio(&self, ranked: &[NicheScoreBreakdown], top_k: usize) -> Vec<ExperimentPlan> {
        ranked
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(idx, niche)| {
                let slug: String = niche
                    .niche_name
                    .to_lowercase()
                    .replace(' ', "_")
                    .chars()
                    .take(HANDLE_SLUG_CHARS)
                    .collect();
                ExperimentPlan {
                    niche_name: niche.niche_name.clone(),
                    account_handle: format!("@pilot_{}_{slug}", idx + 1),
                    cadence_per_week: CADENCE_PER_WEEK,
                    planned_posts: PLANNED_POSTS,
                    content_format_mix: vec![
                        "short reel".to_string(),
                        "carousel".to_string(),
                        "story".to_string(),
                    ],
                }
            })
            .collect()
    }

    /// Split pilot outcomes into winners (top 40%, at least one) and a kill
    /// list. Ranking keys are follow conversion, saves+shares per view,
    /// retention, then median views.
    pub fn evaluate_results(&self, outcomes: &[ExperimentOutcome]) -> NicheEvaluation {
        if outcomes.is_empty() {
            return NicheEvaluation::default();
        }

        let mut ranked: Vec<&ExperimentOutcome> = outcomes.iter().collect();
        ranked.sort_by(|a, b| {
            b.follow_conversion_rate
                .total_cmp(&a.follow_conversion_rate)
                .then(b.saves_shares_per_view.total_cmp(&a.saves_shares_per_view))
                .then(b.retention_proxy.total_cmp(&a.retention_proxy))
                .then(b.median_views.total_cmp(&a.median_views))
        });

        let count = ranked.len();
        let winner_count = (count * 2).div_ceil(5).max(1);
        let (winners, losers) = ranked.split_at(winner_count.min(count));

        let n = count as f64;
        let summary = EvaluationSummary {
            count,
            mean_follow_conversion: round4(
                ranked.iter().map(|o| o.follow_conversion_rate).sum::<f64>() / n,
            ),
            mean_retention_proxy: round4(ranked.iter().map(|o| o.retention_proxy).sum::<f64>() / n),
        };

        tracing::info!(count, winners = winners.len(), "evaluated niche pilots");

        NicheEvaluation {
            winners: winners.iter().map(|o| o.niche_name.clone()).collect(),
            kill_list: losers.iter().map(|o| o.niche_name.clone()).collect(),
            summary,
        }
    }

    pub fn build_decision_report(
        &self,
        ranked: Vec<NicheScoreBreakdown>,
        portfolio: Vec<ExperimentPlan>,
    ) -> DecisionReport {
        DecisionReport {
            generated_at: Utc::now(),
            ranked_niches: ranked,
            portfolio_plan: portfolio,
            recommended_posting_plan: PostingPlan {
                phase: "stage-1-portfolio-test".to_string(),
                posts_per_niche: PLANNED_POSTS,
                cadence_per_week: CADENCE_PER_WEEK,
                kill_threshold: "bottom_60_percent".to_string(),
            },
        }
    }

    pub fn update_model(&self) -> ModelStatus {
        ModelStatus {
            model_version: MODEL_VERSION.to_string(),
            status: "ready_for_learning_phase".to_string(),
        }
    }
}
