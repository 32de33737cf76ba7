//! Niche strategy commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{load_config_and_logging, read_json_input};
use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::domain::models::{DecisionReport, ExperimentOutcome, ModelStatus, NicheEvaluation};
use crate::services::niche_strategy::{DEFAULT_PORTFOLIO_SIZE, DEFAULT_VARIANTS_PER_SEED};
use crate::services::NicheStrategyEngine;

#[derive(Args, Debug)]
pub struct NicheArgs {
    #[command(subcommand)]
    pub command: NicheCommands,
}

#[derive(Subcommand, Debug)]
pub enum NicheCommands {
    /// Generate, score, and rank niche candidates, then plan a pilot portfolio
    Rank {
        /// Seed categories
        #[arg(required = true)]
        seeds: Vec<String>,
        /// Candidates generated per seed
        #[arg(long, default_value_t = DEFAULT_VARIANTS_PER_SEED)]
        variants_per_seed: usize,
        /// Number of niches to pilot
        #[arg(long, default_value_t = DEFAULT_PORTFOLIO_SIZE)]
        top_k: usize,
        /// Constraint (format: "key=value"), repeatable
        #[arg(short, long)]
        constraint: Vec<String>,
    },
    /// Pick winners and a kill list from pilot outcomes
    Evaluate {
        /// JSON array of experiment outcomes ("-" for stdin)
        outcomes: PathBuf,
    },
}

#[derive(Debug, Serialize)]
pub struct RankOutput {
    #[serde(flatten)]
    pub report: DecisionReport,
}

impl CommandOutput for RankOutput {
    fn to_human(&self) -> String {
        let mut ranked = table(&["#", "NICHE", "SCORE", "RISKS"]);
        for (idx, niche) in self.report.ranked_niches.iter().enumerate() {
            ranked.add_row(vec![
                (idx + 1).to_string(),
                truncate(&niche.niche_name, 40),
                format!("{:.4}", niche.success_score),
                niche.top_risks.join(", "),
            ]);
        }

        let mut portfolio = table(&["NICHE", "ACCOUNT", "POSTS", "PER WEEK"]);
        for plan in &self.report.portfolio_plan {
            portfolio.add_row(vec![
                truncate(&plan.niche_name, 40),
                plan.account_handle.clone(),
                plan.planned_posts.to_string(),
                plan.cadence_per_week.to_string(),
            ]);
        }

        let posting = &self.report.recommended_posting_plan;
        format!(
            "Ranked niches:\n{ranked}\n\nPortfolio:\n{portfolio}\n\nPlan: {} ({} posts per niche, {}/week, kill {})",
            posting.phase, posting.posts_per_niche, posting.cadence_per_week, posting.kill_threshold
        )
    }
}

#[derive(Debug, Serialize)]
pub struct EvaluateOutput {
    #[serde(flatten)]
    pub evaluation: NicheEvaluation,
    pub model: ModelStatus,
}

impl CommandOutput for EvaluateOutput {
    fn to_human(&self) -> String {
        let summary = &self.evaluation.summary;
        if summary.count == 0 {
            return "No outcomes to evaluate.".to_string();
        }

        let mut lines = vec![format!(
            "Evaluated {} pilot(s): mean follow conversion {:.4}, mean retention {:.4}",
            summary.count, summary.mean_follow_conversion, summary.mean_retention_proxy
        )];
        lines.push("\nScale:".to_string());
        lines.extend(self.evaluation.winners.iter().map(|n| format!("  + {n}")));
        if !self.evaluation.kill_list.is_empty() {
            lines.push("\nKill:".to_string());
            lines.extend(self.evaluation.kill_list.iter().map(|n| format!("  - {n}")));
        }
        lines.push(format!(
            "\nModel {}: {}",
            self.model.model_version, self.model.status
        ));
        lines.join("\n")
    }
}

fn parse_constraints(raw: &[String]) -> Result<BTreeMap<String, serde_json::Value>> {
    let mut constraints = BTreeMap::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            bail!("Invalid constraint '{item}', expected key=value");
        };
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        constraints.insert(key.trim().to_string(), value);
    }
    Ok(constraints)
}

pub async fn execute(args: NicheArgs, json_mode: bool, config_dir: Option<&Path>) -> Result<()> {
    let (_config, _logger) = load_config_and_logging(config_dir)?;
    let engine = NicheStrategyEngine::default();

    match args.command {
        NicheCommands::Rank {
            seeds,
            variants_per_seed,
            top_k,
            constraint,
        } => {
            let constraints = parse_constraints(&constraint)?;
            let candidates = engine
                .generate_candidates(&seeds, &constraints, variants_per_seed)
                .context("Failed to generate candidates")?;
            let signals = engine.collect_signals(&candidates);
            let ranked = engine
                .score_candidates(&candidates, &signals)
                .context("Failed to score candidates")?;
            let portfolio = engine.select_portfolio(&ranked, top_k);
            let report = engine.build_decision_report(ranked, portfolio);
            output(&RankOutput { report }, json_mode);
        }

        NicheCommands::Evaluate { outcomes } => {
            let outcomes: Vec<ExperimentOutcome> = read_json_input(&outcomes)?;
            let evaluation = engine.evaluate_results(&outcomes);
            let model = engine.update_model();
            output(&EvaluateOutput { evaluation, model }, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constraints() {
        let constraints = parse_constraints(&[
            "budget=500".to_string(),
            "region=EU".to_string(),
            "faceless=true".to_string(),
        ])
        .unwrap();
        assert_eq!(constraints["budget"], serde_json::json!(500));
        assert_eq!(constraints["region"], serde_json::json!("EU"));
        assert_eq!(constraints["faceless"], serde_json::json!(true));
        assert!(parse_constraints(&["nonsense".to_string()]).is_err());
    }

    #[test]
    fn test_rank_output_renders_portfolio() {
        let engine = NicheStrategyEngine::default();
        let candidates = engine
            .generate_candidates(&["fitness".to_string()], &BTreeMap::new(), 2)
            .unwrap();
        let signals = engine.collect_signals(&candidates);
        let ranked = engine.score_candidates(&candidates, &signals).unwrap();
        let portfolio = engine.select_portfolio(&ranked, 1);
        let out = RankOutput {
            report: engine.build_decision_report(ranked, portfolio),
        };

        let human = out.to_human();
        assert!(human.contains("fitness - angle"));
        assert!(human.contains("@pilot_1_"));
        assert_eq!(out.to_json()["portfolio_plan"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_evaluation_message() {
        let out = EvaluateOutput {
            evaluation: NicheEvaluation::default(),
            model: NicheStrategyEngine::default().update_model(),
        };
        assert_eq!(out.to_human(), "No outcomes to evaluate.");
    }
}
