// src/commands.rs

//! Command implementations for the cbzify CLI

use anyhow::Result;
use cbzify::batch::{self, CompositeObserver, LogObserver, ProgressObserver};
use cbzify::job::Outcome;
use cbzify::trash;
use clap::CommandFactory;
use clap_complete::Shell;
use std::path::PathBuf;
use tracing::info;

/// Convert a batch of CBR files to verified CBZ archives
pub fn cmd_convert(
    files: Vec<PathBuf>,
    jobs: Option<usize>,
    trash_originals: bool,
    dry_run: bool,
) -> Result<()> {
    let (queue, rejected) = batch::queue_files(&files);

    for (path, reason) in &rejected {
        println!("  [SKIPPED] {}: {}", path.display(), reason);
    }
    if queue.is_empty() {
        anyhow::bail!("no .cbr files to convert");
    }

    if dry_run {
        println!("Would convert {} file(s):", queue.len());
        for path in &queue {
            println!("  {}", path.display());
        }
        return Ok(());
    }

    let concurrency = jobs.unwrap_or_else(batch::default_concurrency);
    info!(
        "Starting conversion of {} file(s) using {} worker(s)",
        queue.len(),
        concurrency
    );

    let progress = ProgressObserver::new(queue.len() as u64);
    let observer =
        CompositeObserver::new(vec![Box::new(LogObserver), Box::new(progress.clone())]);
    let result = batch::run_batch(&queue, concurrency, &observer)?;
    progress.finish();

    println!();
    for (path, outcome) in result.outcomes() {
        let tag = if outcome.is_success() {
            "[OK]"
        } else if outcome.is_skip() {
            "[SKIPPED]"
        } else {
            "[FAILED]"
        };
        println!("  {} {}: {}", tag, path.display(), outcome.summary());
        if let Outcome::ExtractFailed { diagnosis, .. } = outcome {
            for line in diagnosis.to_string().lines() {
                println!("      {}", line);
            }
        }
    }
    println!(
        "\nConverted {} of {} file(s) ({} skipped, {} failed)",
        result.succeeded(),
        result.len(),
        result.skipped(),
        result.failed()
    );

    if trash_originals && result.succeeded() > 0 {
        let report = trash::trash_files(&result.successful_paths());
        print_trash_report(&report);
    }

    if result.failed() > 0 {
        anyhow::bail!("{} conversion(s) failed", result.failed());
    }
    Ok(())
}

/// Move files to the trash
pub fn cmd_trash(files: Vec<PathBuf>) -> Result<()> {
    let paths: Vec<&std::path::Path> = files.iter().map(|p| p.as_path()).collect();
    let report = trash::trash_files(&paths);
    print_trash_report(&report);
    if !report.failed.is_empty() {
        anyhow::bail!("{} file(s) could not be trashed", report.failed.len());
    }
    Ok(())
}

fn print_trash_report(report: &trash::TrashReport) {
    for path in &report.trashed {
        println!("  [OK] trashed {}", path.display());
    }
    for (path, reason) in &report.failed {
        println!("  [FAILED] {}: {}", path.display(), reason);
    }
    println!(
        "Moved {} file(s) to trash; restore with: gio trash --list && gio trash --restore <URI>",
        report.trashed.len()
    );
}

/// Generate shell completions on stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = crate::cli::Cli::command();
    clap_complete::generate(shell, &mut cmd, "cbzify", &mut std::io::stdout());
    Ok(())
}
