//! repo-policy CLI
//!
//! Applies declarative policies to GitHub repositories and their Travis CI
//! configuration.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to set up logging: {}", "warning".yellow().bold(), e);
    }

    if let Err(e) = execute_command(cli.command).await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Apply {
            policy,
            repositories,
            concurrency,
            credentials,
        } => commands::run_apply(&policy, &repositories, concurrency, &credentials).await,
        Commands::Goals => {
            commands::run_goals();
            Ok(())
        }
        Commands::List { dir, ext } => commands::run_list(&dir, &ext),
    }
}
