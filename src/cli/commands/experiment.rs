//! Experiment CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use super::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ArmKey, ArmStats, LifecycleResult, PostMetrics};

#[derive(Args, Debug)]
pub struct ExperimentArgs {
    #[command(subcommand)]
    pub command: ExperimentCommands,
}

#[derive(Subcommand, Debug)]
pub enum ExperimentCommands {
    /// Choose the variant for the next post
    Assign {
        /// Experiment ID
        experiment_id: String,
        /// Candidate variants (comma separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        variants: Vec<String>,
    },
    /// Record the observed metrics of a post
    Record {
        /// Experiment ID
        experiment_id: String,
        /// Variant the post used
        variant: String,
        /// Brief the post was produced from
        #[arg(long, default_value = "")]
        brief_id: String,
        #[arg(long, default_value_t = 0)]
        views: u64,
        #[arg(long, default_value_t = 0)]
        likes: u64,
        #[arg(long, default_value_t = 0)]
        comments: u64,
        #[arg(long, default_value_t = 0)]
        shares: u64,
        #[arg(long, default_value_t = 0)]
        saves: u64,
        /// Average watch time in seconds
        #[arg(long, default_value_t = 0.0)]
        watch_time: f64,
    },
    /// Promote the best variant with enough samples
    Promote {
        /// Experiment ID
        experiment_id: String,
        /// Candidate variants (comma separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        variants: Vec<String>,
        /// Minimum pulls per variant (defaults to optimization.min_sample_size_for_winner)
        #[arg(long)]
        min_samples: Option<u64>,
    },
    /// Mark an experiment as archived
    Archive {
        /// Experiment ID
        experiment_id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct AssignOutput {
    pub experiment_id: String,
    pub variant: String,
}

impl CommandOutput for AssignOutput {
    fn to_human(&self) -> String {
        format!("{}: use variant '{}'", self.experiment_id, self.variant)
    }
}

#[derive(Debug, Serialize)]
pub struct RecordOutput {
    pub arm_key: String,
    pub reward: f64,
    pub pulls: u64,
    pub avg_reward: f64,
}

impl RecordOutput {
    fn new(arm_key: String, reward: f64, stats: ArmStats) -> Self {
        Self {
            arm_key,
            reward,
            pulls: stats.pulls,
            avg_reward: stats.avg_reward(),
        }
    }
}

impl CommandOutput for RecordOutput {
    fn to_human(&self) -> String {
        format!(
            "Recorded reward {:.4} for {} ({} pull(s), average {:.4})",
            self.reward, self.arm_key, self.pulls, self.avg_reward
        )
    }
}

#[derive(Debug, Serialize)]
pub struct LifecycleOutput {
    pub experiment_id: String,
    #[serde(flatten)]
    pub result: LifecycleResult,
}

impl CommandOutput for LifecycleOutput {
    fn to_human(&self) -> String {
        match (&self.result.winner, self.result.archived) {
            (_, true) => format!("Experiment {} archived.", self.experiment_id),
            (Some(winner), false) => {
                format!("Experiment {}: promoted '{winner}'.", self.experiment_id)
            }
            (None, false) => format!(
                "Experiment {}: no variant has enough samples yet.",
                self.experiment_id
            ),
        }
    }
}

pub async fn execute(args: ExperimentArgs, json_mode: bool, config_dir: Option<&Path>) -> Result<()> {
    let ctx = AppContext::bootstrap(config_dir).await?;
    let optimization = ctx.optimization_snapshot().await;

    match args.command {
        ExperimentCommands::Assign { experiment_id, variants } => {
            let variant = ctx
                .lifecycle
                .assign_variant(&experiment_id, &variants, &optimization)
                .await
                .context("Failed to assign variant")?;
            output(&AssignOutput { experiment_id, variant }, json_mode);
        }

        ExperimentCommands::Record {
            experiment_id,
            variant,
            brief_id,
            views,
            likes,
            comments,
            shares,
            saves,
            watch_time,
        } => {
            let metrics = PostMetrics {
                brief_id,
                views,
                likes,
                comments,
                shares,
                saves,
                avg_watch_time_seconds: watch_time,
            };
            let reward = ctx
                .lifecycle
                .register_outcome(&experiment_id, &variant, &metrics, &optimization)
                .await;
            ctx.checkpoint(&Uuid::new_v4().to_string()).await?;

            let arm_key = ArmKey::experiment(&experiment_id, &variant);
            let stats = ctx.lifecycle.optimizer().read().await.stats(&arm_key);
            output(&RecordOutput::new(arm_key, reward, stats), json_mode);
        }

        ExperimentCommands::Promote {
            experiment_id,
            variants,
            min_samples,
        } => {
            let min_samples = min_samples.unwrap_or_else(|| optimization.min_sample_size_for_winner());
            let result = ctx
                .lifecycle
                .promote_winner(&experiment_id, &variants, min_samples)
                .await
                .context("Failed to promote winner")?;
            output(&LifecycleOutput { experiment_id, result }, json_mode);
        }

        ExperimentCommands::Archive { experiment_id } => {
            let archived = ctx
                .lifecycle
                .archive_experiment(&experiment_id, &Uuid::new_v4().to_string())
                .await
                .context("Failed to archive experiment")?;
            let result = LifecycleResult {
                archived,
                ..LifecycleResult::no_winner()
            };
            output(&LifecycleOutput { experiment_id, result }, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_parse_record() {
        let cli = Cli::try_parse_from([
            "contentloop", "experiment", "record", "exp-1", "a", "--views", "120", "--saves", "4",
        ])
        .unwrap();
        let crate::cli::Commands::Experiment(args) = cli.command else {
            panic!("expected experiment command");
        };
        match args.command {
            ExperimentCommands::Record { views, saves, likes, .. } => {
                assert_eq!(views, 120);
                assert_eq!(saves, 4);
                assert_eq!(likes, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_assign_requires_variants() {
        assert!(Cli::try_parse_from(["contentloop", "experiment", "assign", "exp-1"]).is_err());
        let cli =
            Cli::try_parse_from(["contentloop", "experiment", "assign", "exp-1", "-v", "a,b"]).unwrap();
        let crate::cli::Commands::Experiment(args) = cli.command else {
            panic!("expected experiment command");
        };
        let ExperimentCommands::Assign { variants, .. } = args.command else {
            panic!("expected assign");
        };
        assert_eq!(variants, ["a", "b"]);
    }

    #[test]
    fn test_lifecycle_output_messages() {
        let promoted = LifecycleOutput {
            experiment_id: "exp-1".to_string(),
            result: LifecycleResult {
                winner: Some("b".to_string()),
                promoted: true,
                archived: false,
            },
        };
        assert_eq!(promoted.to_human(), "Experiment exp-1: promoted 'b'.");
        assert_eq!(promoted.to_json()["winner"], "b");

        let pending = LifecycleOutput {
            experiment_id: "exp-1".to_string(),
            result: LifecycleResult::no_winner(),
        };
        assert!(pending.to_human().contains("no variant"));
    }
}
