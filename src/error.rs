// src/error.rs
//! Error types for the conversion library

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from filesystem and subprocess plumbing.
///
/// Job-level failures (extraction exhausted, count mismatch, ...) are not
/// errors: they are terminal [`crate::job::Outcome`] values, fully recovered
/// at the job boundary so that one file never aborts the batch.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// External tool could not be launched (missing binary, permissions)
    #[error("Failed to launch '{tool}': {source}")]
    ToolLaunch {
        tool: &'static str,
        source: io::Error,
    },

    /// Path exists but cannot be read or traversed
    #[error("Cannot read '{path}': {source}")]
    Unreadable { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
