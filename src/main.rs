//! Contentloop CLI entry point.

use clap::Parser;

use contentloop::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.as_deref();

    let result = match cli.command {
        Commands::Cycle(args) => contentloop::cli::commands::cycle::execute(args, cli.json, config_dir).await,
        Commands::Experiment(args) => {
            contentloop::cli::commands::experiment::execute(args, cli.json, config_dir).await
        }
        Commands::Arms(args) => contentloop::cli::commands::arms::execute(args, cli.json, config_dir).await,
        Commands::Niche(args) => contentloop::cli::commands::niche::execute(args, cli.json, config_dir).await,
        Commands::Decisions(args) => {
            contentloop::cli::commands::decisions::execute(args, cli.json, config_dir).await
        }
    };

    if let Err(err) = result {
        contentloop::cli::handle_error(err, cli.json);
    }
}
