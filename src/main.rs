// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            files,
            jobs,
            trash_originals,
            dry_run,
        }) => commands::cmd_convert(files, jobs, trash_originals, dry_run),
        Some(Commands::Trash { files }) => commands::cmd_trash(files),
        Some(Commands::Completions { shell }) => commands::cmd_completions(shell),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
