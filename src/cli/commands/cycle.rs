//! Adaptive cycle command.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{read_json_input, AppContext};
use crate::adapters::sqlite::SqliteDecisionLogRepository;
use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::{AdaptiveCapability, AnalyticsPayload, CycleReport, StepUpdate};
use crate::domain::ports::QueuedAnalyticsSource;
use crate::services::AdaptiveCycleCoordinator;

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// JSON file with one payload or an array of payloads ("-" for stdin)
    #[arg(default_value = "-")]
    pub payload: PathBuf,

    /// Capabilities to run, overriding adaptive.enabled
    #[arg(short, long, value_delimiter = ',')]
    pub enable: Vec<AdaptiveCapability>,

    /// Seconds between cycles when several payloads are given
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Stop after this many cycles
    #[arg(long)]
    pub max_cycles: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadInput {
    Many(Vec<AnalyticsPayload>),
    One(Box<AnalyticsPayload>),
}

#[derive(Debug, Serialize)]
pub struct CycleRunOutput {
    pub reports: Vec<CycleReport>,
    pub arms_checkpointed: usize,
    pub optimization_saved: bool,
}

impl CommandOutput for CycleRunOutput {
    fn to_human(&self) -> String {
        if self.reports.is_empty() {
            return "No payloads processed.".to_string();
        }

        let mut sections = Vec::with_capacity(self.reports.len() + 1);
        for report in &self.reports {
            let mut lines = vec![format!(
                "Cycle {} (optimization v{})",
                report.trace_id, report.optimization_version
            )];
            if report.updates.is_empty() {
                lines.push("  no updates".to_string());
            } else {
                let mut t = table(&["CAPABILITY", "RESULT"]);
                for (capability, update) in &report.updates {
                    t.add_row(vec![capability.to_string(), summarize(update)]);
                }
                lines.push(t.to_string());
            }
            sections.push(lines.join("\n"));
        }
        sections.push(format!("Checkpointed {} arm(s).", self.arms_checkpointed));
        if self.optimization_saved {
            sections.push("Saved updated optimization settings.".to_string());
        }
        sections.join("\n\n")
    }
}

fn summarize(update: &StepUpdate) -> String {
    match update {
        StepUpdate::ExperimentLifecycle(u) => match &u.winner {
            Some(winner) => format!("{}: promoted {winner}, archived={}", u.experiment_id, u.archived),
            None => format!("{}: no winner yet", u.experiment_id),
        },
        StepUpdate::LearningLoop(r) => format!(
            "{} samples, mae {:.4}, epsilon {:.4}",
            r.update.sample_count, r.update.mean_absolute_error, r.epsilon_exploration
        ),
        StepUpdate::ObjectiveStrategy(s) => format!(
            "objective {} -> {}",
            s.objective,
            serde_json::to_string(&s.adjusted_weights).unwrap_or_default()
        ),
        StepUpdate::ModeController(d) => format!(
            "{} (explore {:.4}): {}",
            d.mode.as_str(),
            d.explore_coef,
            d.rationale.join(", ")
        ),
        StepUpdate::ShadowTesting(w) => match &w.winner_variant_id {
            Some(winner) => format!("winner {winner}"),
            None => "deferred".to_string(),
        },
        StepUpdate::MonetizationAnalytics(i) => format!(
            "objective {:.4} (growth {:.4}, monetization {:.4}){}",
            i.total_objective,
            i.growth_score,
            i.monetization_score,
            if i.drift_flag { " DRIFT" } else { "" }
        ),
    }
}

pub async fn execute(args: CycleArgs, json_mode: bool, config_dir: Option<&Path>) -> Result<()> {
    let input: PayloadInput = read_json_input(&args.payload)?;
    let ctx = AppContext::bootstrap(config_dir).await?;

    let enabled = if args.enable.is_empty() {
        ctx.config.adaptive.enabled.clone()
    } else {
        args.enable
    };
    if enabled.is_empty() {
        tracing::warn!("no adaptive capabilities enabled; cycles will produce no updates");
    }

    let coordinator = AdaptiveCycleCoordinator::new(Arc::clone(&ctx.optimization))
        .with_default_steps(Arc::clone(&ctx.lifecycle), ctx.config.adaptive.shadow_min_views)
        .with_enabled(enabled)
        .with_decision_sink(Arc::new(SqliteDecisionLogRepository::new(ctx.pool.clone())));

    let reports = match input {
        PayloadInput::One(payload) => {
            let trace_id = Uuid::new_v4().to_string();
            vec![coordinator.process_after_analytics(&payload, &trace_id).await?]
        }
        PayloadInput::Many(payloads) => {
            let interval = Duration::from_secs(
                args.interval_secs
                    .unwrap_or(ctx.config.adaptive.cycle_interval_secs),
            );
            coordinator
                .run_scheduled(&QueuedAnalyticsSource::new(payloads), interval, args.max_cycles)
                .await?
        }
    };

    let checkpoint_trace = reports
        .last()
        .map_or_else(|| "cli-cycle".to_string(), |r| r.trace_id.clone());
    let arms_checkpointed = ctx
        .checkpoint(&checkpoint_trace)
        .await
        .context("Cycle finished but arm state was not saved")?;
    let optimization_saved = ctx
        .persist_optimization(&checkpoint_trace)
        .await
        .context("Cycle finished but optimization settings were not saved")?;

    output(
        &CycleRunOutput {
            reports,
            arms_checkpointed,
            optimization_saved,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{LifecycleUpdate, MonetizationInsight};

    #[test]
    fn test_payload_input_accepts_object_or_array() {
        let one: PayloadInput = serde_json::from_str(r#"{"objective": "growth"}"#).unwrap();
        assert!(matches!(one, PayloadInput::One(_)));

        let many: PayloadInput = serde_json::from_str(r#"[{}, {"objective": "growth"}]"#).unwrap();
        match many {
            PayloadInput::Many(payloads) => assert_eq!(payloads.len(), 2),
            PayloadInput::One(_) => panic!("expected an array"),
        }
    }

    #[test]
    fn test_summaries() {
        let promoted = StepUpdate::ExperimentLifecycle(LifecycleUpdate {
            experiment_id: "exp-1".to_string(),
            winner: Some("a".to_string()),
            promoted: true,
            archived: true,
        });
        assert_eq!(summarize(&promoted), "exp-1: promoted a, archived=true");

        let insight = StepUpdate::MonetizationAnalytics(MonetizationInsight {
            monetization_score: 0.1,
            growth_score: 0.8,
            total_objective: 0.555,
            drift_flag: true,
        });
        assert!(summarize(&insight).ends_with("DRIFT"));
    }

    #[test]
    fn test_empty_run_output() {
        let out = CycleRunOutput {
            reports: Vec::new(),
            arms_checkpointed: 0,
            optimization_saved: false,
        };
        assert_eq!(out.to_human(), "No payloads processed.");
        assert_eq!(out.to_json()["arms_checkpointed"], 0);
    }
}
