//! Arm-state inspection commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;

use super::AppContext;
use crate::adapters::sqlite::SqliteArmStateRepository;
use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::domain::models::ArmRecordKind;
use crate::domain::ports::{ArmStateRecord, ArmStateRepository};

#[derive(Args, Debug)]
pub struct ArmsArgs {
    #[command(subcommand)]
    pub command: ArmsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ArmsCommands {
    /// List persisted arms and markers
    List {
        /// Only records for this experiment
        #[arg(short, long)]
        experiment: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct ArmRow {
    pub arm_key: String,
    pub kind: ArmRecordKind,
    pub pulls: u64,
    pub reward_sum: f64,
    pub avg_reward: f64,
    pub schema_version: String,
    pub trace_id: String,
}

impl From<ArmStateRecord> for ArmRow {
    fn from(record: ArmStateRecord) -> Self {
        Self {
            kind: record.kind(),
            avg_reward: record.stats().avg_reward(),
            arm_key: record.arm_key,
            pulls: record.pulls,
            reward_sum: record.reward_sum,
            schema_version: record.schema_version,
            trace_id: record.trace_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArmListOutput {
    pub arms: Vec<ArmRow>,
    pub total: usize,
}

impl CommandOutput for ArmListOutput {
    fn to_human(&self) -> String {
        if self.arms.is_empty() {
            return "No arm state recorded.".to_string();
        }

        let mut t = table(&["ARM", "KIND", "PULLS", "AVG REWARD", "TRACE"]);
        for arm in &self.arms {
            t.add_row(vec![
                arm.arm_key.clone(),
                arm.kind.as_str().to_string(),
                arm.pulls.to_string(),
                format!("{:.4}", arm.avg_reward),
                truncate(&arm.trace_id, 12),
            ]);
        }
        format!("Found {} record(s):\n{t}", self.total)
    }
}

/// Whether `arm_key` lives under `experiment_id` in any namespace.
fn belongs_to(arm_key: &str, experiment_id: &str) -> bool {
    arm_key.split("::").nth(1) == Some(experiment_id)
}

pub async fn execute(args: ArmsArgs, json_mode: bool, config_dir: Option<&Path>) -> Result<()> {
    let ctx = AppContext::bootstrap(config_dir).await?;
    let repo = SqliteArmStateRepository::new(ctx.pool.clone());

    match args.command {
        ArmsCommands::List { experiment } => {
            let arms: Vec<ArmRow> = repo
                .load_arm_states()
                .await
                .context("Failed to load arm state")?
                .into_iter()
                .filter(|r| experiment.as_deref().is_none_or(|id| belongs_to(&r.arm_key, id)))
                .map(ArmRow::from)
                .collect();
            let total = arms.len();
            output(&ArmListOutput { arms, total }, json_mode);
        }
    }

    Ok(())
}
