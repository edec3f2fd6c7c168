//! sprintlens - CLI to derive sprint metrics from issue-tracker exports
//!
//! Loads an exported issue snapshot, runs the metrics pipeline and prints
//! the narrative report or raw JSON metrics.

use anyhow::{Context, Result};
use clap::Parser;
use sprintlens_core::format::fmt_days;
use sprintlens_core::{ingest, metrics, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sprintlens")]
#[command(about = "Sprint metrics from issue-tracker status histories")]
#[command(version)]
struct Args {
    /// Snapshot file to analyze.
    /// If not provided, the newest export in the configured snapshot
    /// directory is used.
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Show the per-issue metrics table
    #[arg(short, long)]
    issues: bool,

    /// Verbose output (list every decode warning)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        sprintlens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Resolve the snapshot to analyze
    let snapshot_path = match args.snapshot {
        Some(path) => path,
        None => {
            let dir = config.snapshots.resolved_dir();
            match ingest::latest_snapshot(&dir)? {
                Some(path) => path,
                None => {
                    println!("No snapshots found in {}.", dir.display());
                    println!("Export issues from your tracker or pass --snapshot <file>.");
                    return Ok(());
                }
            }
        }
    };

    tracing::info!(snapshot = %snapshot_path.display(), "Analyzing snapshot");

    let batch = ingest::load_snapshot(&snapshot_path, &config.fields)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;

    if !batch.warnings.is_empty() {
        eprintln!(
            "{} decode warning(s); run with --verbose to list them",
            batch.warnings.len()
        );
        if args.verbose {
            for warning in &batch.warnings {
                eprintln!("  {}", warning);
            }
        }
    }

    let vocab = config.statuses.vocabulary();
    let computed = metrics::compute_batch(&batch.issues, &vocab);

    if args.format == "json" {
        print_json(&batch, &computed)?;
    } else {
        print_text(&batch, &computed, args.issues);
    }

    Ok(())
}

fn print_text(
    batch: &sprintlens_core::SnapshotBatch,
    computed: &metrics::BatchMetrics,
    show_issues: bool,
) {
    println!("Snapshot: {}", batch.source.display());

    if show_issues {
        println!();
        println!(
            "{:<12} {:>8} {:>8} {:>8}  {:<8} {}",
            "KEY", "CYCLE", "LEAD", "BLOCKED", "REOPENED", "SPRINT"
        );
        for issue in &computed.issues {
            println!(
                "{:<12} {:>8} {:>8} {:>8}  {:<8} {}",
                issue.key,
                fmt_days(issue.cycle_time_days),
                fmt_days(issue.lead_time_days),
                fmt_days(issue.blocked_days),
                if issue.reopened { "yes" } else { "no" },
                issue
                    .sprint_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    println!();
    println!("{}", metrics::render_summary(&computed.aggregate));

    println!("\n---");
    println!(
        "{} issue(s), {} completed, {} decode warning(s)",
        computed.aggregate.issue_count,
        computed.aggregate.completed_count,
        batch.warnings.len()
    );
}

fn print_json(
    batch: &sprintlens_core::SnapshotBatch,
    computed: &metrics::BatchMetrics,
) -> Result<()> {
    let output = serde_json::json!({
        "source": batch.source.display().to_string(),
        "warnings": batch.warnings,
        "issues": computed.issues,
        "aggregate": computed.aggregate,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
