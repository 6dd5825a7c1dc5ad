// src/trash.rs

//! Origin disposal
//!
//! Converted originals are moved to the desktop trash via `gio trash`, never
//! permanently deleted, so a bad batch can always be restored with
//! `gio trash --restore`.

use crate::tool::run_tool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-path disposal results
#[derive(Debug, Default)]
pub struct TrashReport {
    pub trashed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Move each path to the trash, reporting per-path success or failure.
/// A missing `gio` binary fails each path, never the process.
pub fn trash_files(paths: &[&Path]) -> TrashReport {
    let mut report = TrashReport::default();
    for path in paths {
        if !path.exists() {
            report
                .failed
                .push((path.to_path_buf(), "no longer exists".to_string()));
            continue;
        }
        match run_tool("gio", [Path::new("trash").as_os_str(), path.as_os_str()], None) {
            Ok(out) if out.success() => {
                info!("Moved to trash: {}", path.display());
                report.trashed.push(path.to_path_buf());
            }
            Ok(out) => {
                let reason = if out.stderr.trim().is_empty() {
                    format!("gio trash exited with {:?}", out.code)
                } else {
                    out.stderr.trim().to_string()
                };
                warn!("Could not trash {}: {}", path.display(), reason);
                report.failed.push((path.to_path_buf(), reason));
            }
            Err(e) => {
                warn!("Could not trash {}: {}", path.display(), e);
                report.failed.push((path.to_path_buf(), e.to_string()));
            }
        }
    }
    report
}
