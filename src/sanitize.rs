// src/sanitize.rs

//! Hidden/system metadata filtering
//!
//! Comic archives routinely carry platform junk alongside the pages:
//! AppleDouble `._*` shadows, `.DS_Store`, `Thumbs.db`, `desktop.ini`.
//! These are never counted as content and are stripped from the working
//! tree before repackaging.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Well-known junk basenames, matched case-insensitively
const JUNK_BASENAMES: [&str; 3] = ["thumbs.db", ".ds_store", "desktop.ini"];

/// True when a basename is hidden/system metadata rather than content.
///
/// Any dotfile qualifies (which covers the `._` AppleDouble prefix), plus the
/// explicit junk set.
pub fn is_ignorable(name: &str) -> bool {
    if name.starts_with('.') {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    JUNK_BASENAMES.contains(&lower.as_str())
}

/// Delete every ignorable file under `root`, recursively.
///
/// Only files are removed; directory structure is left untouched. Returns
/// the number of files deleted.
pub fn sanitize(root: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| std::io::Error::other(e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_ignorable(&name) {
            debug!("Removing system file: {}", entry.path().display());
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
