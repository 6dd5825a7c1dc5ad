// src/cli.rs
//! CLI definitions for cbzify
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cbzify")]
#[command(author = "cbzify Contributors")]
#[command(version)]
#[command(about = "Batch CBR to CBZ comic archive converter with verified repackaging", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert CBR archives to verified CBZ archives
    Convert {
        /// CBR files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Number of parallel conversion workers (default: logical CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Move successfully converted originals to the trash
        #[arg(long)]
        trash_originals: bool,

        /// List what would be converted without converting
        #[arg(long)]
        dry_run: bool,
    },

    /// Move files to the trash via gio
    Trash {
        /// Files to trash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
