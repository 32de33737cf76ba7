//! Decision log commands.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

use super::AppContext;
use crate::adapters::sqlite::{DecisionLogEntry, SqliteDecisionLogRepository};
use crate::cli::output::{output, table, CommandOutput};

#[derive(Args, Debug)]
pub struct DecisionsArgs {
    /// Number of most recent decisions to show
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct DecisionRow {
    pub id: String,
    pub trace_id: String,
    pub decision_type: String,
    pub capabilities: Vec<String>,
    pub created_at: String,
    pub updates: serde_json::Value,
}

impl From<DecisionLogEntry> for DecisionRow {
    fn from(entry: DecisionLogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            capabilities: entry.updates.keys().map(ToString::to_string).collect(),
            updates: serde_json::to_value(&entry.updates).unwrap_or_default(),
            trace_id: entry.trace_id,
            decision_type: entry.decision_type,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecisionListOutput {
    pub decisions: Vec<DecisionRow>,
}

impl CommandOutput for DecisionListOutput {
    fn to_human(&self) -> String {
        if self.decisions.is_empty() {
            return "No decisions recorded.".to_string();
        }

        let mut t = table(&["CREATED", "TRACE", "CAPABILITIES"]);
        for decision in &self.decisions {
            t.add_row(vec![
                decision.created_at.clone(),
                decision.trace_id.clone(),
                decision.capabilities.join(", "),
            ]);
        }
        t.to_string()
    }
}

pub async fn execute(args: DecisionsArgs, json_mode: bool, config_dir: Option<&Path>) -> Result<()> {
    let ctx = AppContext::bootstrap(config_dir).await?;
    let repo = SqliteDecisionLogRepository::new(ctx.pool.clone());

    let decisions = repo
        .list_recent(args.limit)
        .await
        .context("Failed to read decision log")?
        .into_iter()
        .map(DecisionRow::from)
        .collect();
    output(&DecisionListOutput { decisions }, json_mode);
    Ok(())
}
