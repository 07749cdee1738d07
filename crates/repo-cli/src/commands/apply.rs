//! Apply a policy to a list of repositories

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use repo_policy::{Coordinator, RunSummary, load_policy, load_repositories};

use super::registry;
use crate::cli::Credentials;
use crate::error::{CliError, Result};

/// Run the apply command
///
/// Both documents are loaded before any repository is touched.
pub async fn run_apply(
    policy: &Path,
    repositories: &Path,
    concurrency: Option<u16>,
    credentials: &Credentials,
) -> Result<()> {
    let policy = load_policy(policy)?;
    let targets = load_repositories(repositories)?;
    tracing::info!(
        goals = policy.len(),
        targets = targets.len(),
        "Applying policy"
    );

    let mut coordinator = Coordinator::new(Arc::new(registry()), Arc::new(policy))
        .with_defaults(credentials.facts());
    if let Some(limit) = concurrency {
        coordinator = coordinator.with_concurrency(usize::from(limit));
    }

    let summary = coordinator.run(targets).await;
    print_summary(&summary);

    let failed = summary.failed().count();
    if failed > 0 {
        return Err(CliError::TargetsFailed {
            failed,
            total: summary.outcomes.len(),
        });
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        let url = outcome.target.url();
        match &outcome.result {
            Ok(report) => {
                println!("{} {}", "ok".green().bold(), url);
                if report.changes.is_empty() {
                    println!("    {}", "no changes".dimmed());
                }
                for change in &report.changes {
                    println!("    {}: {}", change.goal.cyan(), change.action);
                }
            }
            Err(e) => println!("{} {}: {}", "FAILED".red().bold(), url, e),
        }
    }

    println!();
    println!(
        "{} succeeded, {} failed",
        summary.succeeded().count(),
        summary.failed().count()
    );
}
