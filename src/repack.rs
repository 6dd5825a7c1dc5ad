// src/repack.rs

//! CBZ repackaging
//!
//! The destination archive is built by `zip -r` running *inside* the working
//! root, so member paths are relative to the content root rather than
//! prefixed with temp-directory structure. Dotted entries are excluded at
//! packaging time as well, matching the sanitizer's filter.

use crate::tool::run_tool;
use std::path::Path;
use tracing::debug;

/// Build `dest` from the contents of `working_root`.
///
/// Returns the packaging tool's error text on failure (non-zero exit, launch
/// failure, or watchdog kill).
pub fn repackage(working_root: &Path, dest: &Path) -> Result<(), String> {
    debug!(
        "Packing {} from {}",
        dest.display(),
        working_root.display()
    );
    // zip runs with the working root as cwd; a relative destination must be
    // resolved against the caller's cwd first
    let dest = if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| format!("cannot resolve working directory: {}", e))?
            .join(dest)
    };
    let args = [
        Path::new("-r").as_os_str(),
        Path::new("-q").as_os_str(),
        dest.as_os_str(),
        Path::new(".").as_os_str(),
        Path::new("-x").as_os_str(),
        Path::new(".*").as_os_str(),
        Path::new("*/.*").as_os_str(),
    ];
    match run_tool("zip", args, Some(working_root)) {
        Ok(out) if out.success() => Ok(()),
        Ok(out) => Err(if out.stderr.trim().is_empty() {
            format!("zip exited with {:?}", out.code)
        } else {
            out.stderr.trim().to_string()
        }),
        Err(e) => Err(e.to_string()),
    }
}
