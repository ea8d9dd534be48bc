mod caldav;
mod config;
mod diff;
mod error;
mod ics;
mod report;
mod runner;
mod source;
mod sync;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use report::LogReporter;
use runner::PairResult;

#[derive(Parser)]
#[command(name = "icsync")]
#[command(about = "Mirror external ICS feeds into CalDAV calendars")]
struct Cli {
    /// Path to the config file (defaults to ~/.config/icsync/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import and delete events so each calendar matches its feed
    Sync,
    /// Show what `sync` would change, without writing anything
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let cfg = config::load_config(&config_path)?;

    if cfg.calendars.is_empty() {
        anyhow::bail!(
            "No calendars configured in {}.\n\
            Add a [calendars.<name>] section for each pair to sync.",
            config_path.display()
        );
    }

    match cli.command {
        Commands::Sync => cmd_sync(&cfg).await,
        Commands::Status => cmd_status(&cfg).await,
    }
}

async fn cmd_sync(cfg: &config::Config) -> Result<()> {
    let reporter = LogReporter;
    let results = runner::run_all(&cfg.calendars, &reporter).await;

    let mut imported = 0;
    let mut deleted = 0;
    let mut failed = 0;
    let mut skipped_pairs = 0;

    for (_, result) in &results {
        match result {
            PairResult::Completed(summary) => {
                imported += summary.imported;
                deleted += summary.deleted;
                failed += summary.failed;
            }
            PairResult::Skipped(_) => skipped_pairs += 1,
        }
    }

    println!(
        "\n{} imported, {} deleted, {} failed across {} calendars ({} skipped)",
        imported,
        deleted,
        failed,
        results.len(),
        skipped_pairs
    );

    Ok(())
}

async fn cmd_status(cfg: &config::Config) -> Result<()> {
    let plans = runner::plan_all(&cfg.calendars).await;

    let mut any_changes = false;

    for (name, plan) in &plans {
        match plan {
            Ok(changes) if changes.is_empty() => continue,
            Ok(changes) => {
                any_changes = true;
                println!("\n{}", name);
                for change in &changes.to_import {
                    println!("  + {} ({})", change.identity, change.summary);
                }
                for change in &changes.to_delete {
                    println!("  - {} ({})", change.identity, change.summary);
                }
            }
            Err(error) => {
                any_changes = true;
                println!("\n{}: unavailable ({})", name, error);
            }
        }
    }

    if !any_changes {
        println!("Everything up to date.");
    } else {
        println!("\nRun `icsync sync` to apply.");
    }

    Ok(())
}
