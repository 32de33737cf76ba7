//! Top-level CLI definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    arms::ArmsArgs, cycle::CycleArgs, decisions::DecisionsArgs, experiment::ExperimentArgs,
    niche::NicheArgs,
};

#[derive(Parser, Debug)]
#[command(name = "contentloop")]
#[command(about = "Contentloop - adaptive content strategy engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Directory holding config.yaml and local.yaml
    #[arg(long, global = true, env = "CONTENTLOOP_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the adaptive cycle over one or more analytics payloads
    Cycle(CycleArgs),

    /// Assign variants, record outcomes, and close experiments
    Experiment(ExperimentArgs),

    /// Inspect persisted arm statistics
    Arms(ArmsArgs),

    /// Rank niche candidates and evaluate pilot results
    Niche(NicheArgs),

    /// Show recorded adaptive-cycle decisions
    Decisions(DecisionsArgs),
}
