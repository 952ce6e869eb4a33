//! orderpd-rs fetches selected photos of a yipai360 order.
//!
//! The order's photo catalog is walked page by page; every entry whose
//! filename was requested is downloaded once into a directory named after
//! the order title. A JSON ledger records what was fetched across runs.

#![warn(clippy::all)]

mod catalog;
mod cli;
mod config;
mod download;
mod ledger;
mod types;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog::{Endpoints, HttpCatalog};
use cli::Command;
use download::paths;
use ledger::{JsonLedgerStore, Ledger, LedgerStore};

/// Run the sync command.
async fn run_sync(args: cli::SyncArgs) -> anyhow::Result<()> {
    let config = config::Config::from_cli(args)?;
    tracing::info!(
        order_id = %config.order_id,
        policy = ?config.policy,
        requested = config.fnames.len(),
        "Starting orderpd-rs"
    );

    let endpoints = Endpoints::new(&config.api_base, &config.content_base);
    let catalog = HttpCatalog::new(endpoints, config.timeout)?;
    let ledger_store = JsonLedgerStore::new(&config.history_file);

    let report = download::sync_order(&catalog, &ledger_store, &config.sync_config()).await?;
    for line in report.status_lines() {
        println!("{}", line);
    }
    if report.traversal_aborted {
        tracing::warn!("Catalog walk stopped early; names on later pages were not seen");
    }
    if report.ledger_saved == Some(false) {
        tracing::warn!(
            "Downloads of this run are missing from {}",
            ledger_store.path().display()
        );
    }
    Ok(())
}

/// Lines printed by `status`: every order with its file count, or the files
/// of one order.
fn status_lines(ledger: &Ledger, order_id: Option<&str>) -> Vec<String> {
    if let Some(order_id) = order_id {
        let Some(record) = ledger.record_for(order_id) else {
            return vec![format!("No downloads recorded for order {}", order_id)];
        };
        let mut lines = vec![format!(
            "{} ({}): {} files",
            record.order_id,
            record.title,
            record.files.len()
        )];
        lines.extend(
            record
                .files
                .iter()
                .map(|file| format!("  {} ({})", file.fname, file.etag)),
        );
        return lines;
    }

    if ledger.is_empty() {
        return vec!["No downloads recorded yet".to_string()];
    }
    let mut lines = vec![
        format!("Orders: {}", ledger.records().len()),
        format!("Files:  {}", ledger.len()),
    ];
    for record in ledger.records() {
        lines.push(format!(
            "  {} ({}): {} files",
            record.order_id,
            record.title,
            record.files.len()
        ));
    }
    lines
}

#[derive(Debug, Default)]
struct VerifySummary {
    verified: usize,
    /// One `MISSING:` / `NO PATH:` line per ledger entry without a file.
    problems: Vec<String>,
}

/// Check every ledger entry against `root/<order dir>/<filename>`, naming
/// order directories the same way sync does.
fn verify_ledger(ledger: &Ledger, root: &Path, fallback_dir_name: &str) -> VerifySummary {
    let mut summary = VerifySummary::default();
    for record in ledger.records() {
        let directory = paths::order_directory(root, &record.title, fallback_dir_name);
        for file in &record.files {
            match paths::local_download_path(&directory, &file.fname) {
                Some(local_path) if local_path.exists() => summary.verified += 1,
                Some(local_path) => summary
                    .problems
                    .push(format!("MISSING: {} ({})", local_path.display(), file.etag)),
                None => summary.problems.push(format!(
                    "NO PATH: {} - unusable filename {:?}",
                    file.etag, file.fname
                )),
            }
        }
    }
    summary
}

/// Run the status command.
async fn run_status(args: cli::StatusArgs) -> anyhow::Result<()> {
    let store = JsonLedgerStore::new(config::expand_tilde(&args.ledger.history_file));
    if !store.path().exists() {
        println!("No ledger found at {}", store.path().display());
        println!("Run a sync first to create it.");
        return Ok(());
    }

    let ledger = store.load().await;
    println!("Ledger: {}", store.path().display());
    println!();
    for line in status_lines(&ledger, args.order_id.as_deref()) {
        println!("{}", line);
    }
    Ok(())
}

/// Run the verify command.
async fn run_verify(args: cli::VerifyArgs) -> anyhow::Result<()> {
    let store = JsonLedgerStore::new(config::expand_tilde(&args.ledger.history_file));
    if !store.path().exists() {
        println!("No ledger found at {}", store.path().display());
        println!("Run a sync first to create it.");
        return Ok(());
    }

    let ledger = store.load().await;
    let root = config::expand_tilde(&args.directory);

    println!("Verifying {} downloaded files...", ledger.len());
    println!();

    let summary = verify_ledger(&ledger, &root, &args.fallback_dir_name);
    for line in &summary.problems {
        println!("{}", line);
    }

    println!();
    println!("Results:");
    println!("  Verified: {}", summary.verified);
    println!("  Missing:  {}", summary.problems.len());

    if !summary.problems.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.effective_command() {
        Command::Sync(args) => run_sync(args).await,
        Command::Status(args) => run_status(args).await,
        Command::Verify(args) => run_verify(args).await,
    }
}
