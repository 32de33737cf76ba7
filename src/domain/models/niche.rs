//! Records flowing through the niche strategy pipeline.
//!
//! Each stage consumes the previous one by value: candidate, signals,
//! score breakdown, experiment plan, observed outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A proposed niche with the positioning needed to pilot it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheCandidate {
    pub niche_name: String,
    pub target_audience: String,
    pub content_formats: Vec<String>,
    pub unique_angle: String,
    pub example_post_ideas: Vec<String>,
    pub creator_persona_tone: String,
    pub production_requirements: Vec<String>,
    pub monetization_routes: Vec<String>,
}

/// Market signals for one candidate, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NicheSignals {
    pub demand: f64,
    pub saturation: f64,
    pub differentiation_space: f64,
    pub feasibility: f64,
    pub monetization: f64,
    pub production_complexity: f64,
    pub compliance_risk: f64,
    pub asset_dependency: f64,
}

/// Signals keyed by niche name.
pub type NicheSignalMap = BTreeMap<String, NicheSignals>;

/// Weighted score of a candidate and the factors behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheScoreBreakdown {
    pub niche_name: String,
    pub demand: f64,
    pub low_saturation: f64,
    pub feasibility: f64,
    pub differentiation_space: f64,
    pub monetization: f64,
    pub success_score: f64,
    #[serde(default)]
    pub top_risks: Vec<String>,
}

/// Pilot account plan for one selected niche.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentPlan {
    pub niche_name: String,
    pub account_handle: String,
    pub cadence_per_week: u32,
    pub planned_posts: u32,
    pub content_format_mix: Vec<String>,
}

/// Measured result of piloting a niche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    pub niche_name: String,
    pub posts_published: u32,
    pub median_views: f64,
    pub follow_conversion_rate: f64,
    pub saves_shares_per_view: f64,
    pub retention_proxy: f64,
    #[serde(default)]
    pub feasibility_note: String,
}

/// Aggregate figures over an evaluated batch of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub count: usize,
    pub mean_follow_conversion: f64,
    pub mean_retention_proxy: f64,
}

/// Winners to scale and niches to stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NicheEvaluation {
    pub winners: Vec<String>,
    pub kill_list: Vec<String>,
    pub summary: EvaluationSummary,
}

/// Posting plan attached to a decision report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingPlan {
    pub phase: String,
    pub posts_per_niche: u32,
    pub cadence_per_week: u32,
    pub kill_threshold: String,
}

/// Auditable record of a ranking and the portfolio chosen from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub generated_at: DateTime<Utc>,
    pub ranked_niches: Vec<NicheScoreBreakdown>,
    pub portfolio_plan: Vec<ExperimentPlan>,
    pub recommended_posting_plan: PostingPlan,
}

/// Scoring model status returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_version: String,
    pub status: String,
}
