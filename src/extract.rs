// src/extract.rs

//! Multi-strategy extraction chain
//!
//! Real-world CBR files are frequently mislabeled, truncated, or packed by
//! exotic tools, so extraction falls through an ordered chain of backends,
//! stopping at the first one that produces actual content:
//!
//! 1. `unar` - universal extractor, success on exit 0
//! 2. `unrar x -y -kb` - lenient RAR mode keeping broken members, attempted
//!    only for rar MIME types; success on exit 0/1/3 with at least one file
//!    materialized (exit 3 means CRC damage, flagged on the outcome)
//! 3. `7z x` - broad fallback, success on exit 0
//! 4. `unzip` - attempted only for zip MIME types, success on exit 0
//!
//! Every failing backend's stderr is retained so the diagnostics engine can
//! inspect the most informative failure once the chain is exhausted.

use crate::detect;
use crate::tool::run_tool;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extraction backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Unar,
    Unrar,
    SevenZip,
    Unzip,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unar => "unar",
            Self::Unrar => "unrar",
            Self::SevenZip => "7z",
            Self::Unzip => "unzip",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one backend's run, kept for failure diagnostics
#[derive(Debug)]
pub struct ExtractionAttempt {
    pub backend: Backend,
    /// Exit code; `None` for launch failure or watchdog kill
    pub code: Option<i32>,
    pub stderr: String,
    /// Whether any file materialized in the destination tree
    pub produced_files: bool,
}

/// Result of running the chain
#[derive(Debug)]
pub enum ChainOutcome {
    /// A backend succeeded with evidence of extracted content
    Extracted {
        backend: Backend,
        /// Set when unrar exited 3: content extracted past CRC errors, some
        /// pages may be corrupted
        crc_warnings: bool,
    },
    /// Every applicable backend failed
    Failed {
        /// Most informative accumulated stderr, for diagnostics
        error_text: String,
        attempts: Vec<ExtractionAttempt>,
    },
}

/// Run the extraction chain for `source` into `dest`.
pub fn extract(source: &Path, dest: &Path) -> ChainOutcome {
    let mut attempts = Vec::new();
    let mut error_text = String::new();

    // 1. unar handles most containers
    match try_backend(
        Backend::Unar,
        run_tool("unar", [Path::new("-o").as_os_str(), dest.as_os_str(), source.as_os_str()], None),
        dest,
    ) {
        Attempt::Succeeded(outcome) => return outcome,
        Attempt::Failed(attempt) => {
            retain_error(&mut error_text, &attempt.stderr);
            attempts.push(attempt);
        }
    }

    // MIME gates the rar- and zip-specific backends; probe failure degrades
    // to "unknown" and skips both.
    let mime = detect::mime_type(source);
    debug!("{} has MIME type {}", source.display(), mime);

    // 2. unrar in lenient mode, keeping partially-broken members
    if mime.contains("rar") {
        info!("unar failed for {}, trying unrar", source.display());
        let result = run_tool(
            "unrar",
            [
                Path::new("x").as_os_str(),
                Path::new("-y").as_os_str(),
                Path::new("-kb").as_os_str(),
                source.as_os_str(),
                dest.as_os_str(),
            ],
            None,
        );
        match try_unrar(result, dest) {
            Attempt::Succeeded(outcome) => return outcome,
            Attempt::Failed(attempt) => {
                retain_error(&mut error_text, &attempt.stderr);
                attempts.push(attempt);
            }
        }
    }

    // 3. 7z as a broad-format fallback
    info!("Trying 7z for {}", source.display());
    let mut out_flag = OsString::from("-o");
    out_flag.push(dest);
    match try_backend(
        Backend::SevenZip,
        run_tool(
            "7z",
            [
                Path::new("x").as_os_str(),
                out_flag.as_os_str(),
                Path::new("-y").as_os_str(),
                source.as_os_str(),
            ],
            None,
        ),
        dest,
    ) {
        Attempt::Succeeded(outcome) => return outcome,
        Attempt::Failed(attempt) => {
            retain_error(&mut error_text, &attempt.stderr);
            attempts.push(attempt);
        }
    }

    // 4. unzip for mislabeled zip containers
    if mime.contains("zip") {
        info!("Trying unzip for {}", source.display());
        let result = run_tool(
            "unzip",
            [
                Path::new("-q").as_os_str(),
                Path::new("-o").as_os_str(),
                source.as_os_str(),
                Path::new("-d").as_os_str(),
                dest.as_os_str(),
            ],
            None,
        );
        match try_backend(Backend::Unzip, result, dest) {
            Attempt::Succeeded(outcome) => return outcome,
            Attempt::Failed(attempt) => {
                retain_error(&mut error_text, &attempt.stderr);
                attempts.push(attempt);
            }
        }
    }

    ChainOutcome::Failed {
        error_text,
        attempts,
    }
}

enum Attempt {
    Succeeded(ChainOutcome),
    Failed(ExtractionAttempt),
}

/// Standard success criterion: clean zero exit.
fn try_backend(
    backend: Backend,
    result: crate::Result<crate::tool::ToolOutput>,
    dest: &Path,
) -> Attempt {
    match result {
        Ok(out) if out.success() => Attempt::Succeeded(ChainOutcome::Extracted {
            backend,
            crc_warnings: false,
        }),
        Ok(out) => Attempt::Failed(ExtractionAttempt {
            backend,
            code: out.code,
            stderr: out.stderr,
            produced_files: has_any_file(dest),
        }),
        Err(e) => Attempt::Failed(ExtractionAttempt {
            backend,
            code: None,
            stderr: e.to_string(),
            produced_files: false,
        }),
    }
}

/// unrar success criterion: exit 0 (clean), 1 (warnings), or 3 (CRC errors
/// but something extracted), and at least one file present afterwards.
fn try_unrar(result: crate::Result<crate::tool::ToolOutput>, dest: &Path) -> Attempt {
    match result {
        Ok(out) => {
            let lenient_ok = matches!(out.code, Some(0) | Some(1) | Some(3));
            let produced = has_any_file(dest);
            if lenient_ok && produced {
                if out.code == Some(3) {
                    info!("unrar extracted past CRC errors, some pages may be corrupted");
                }
                Attempt::Succeeded(ChainOutcome::Extracted {
                    backend: Backend::Unrar,
                    crc_warnings: out.code == Some(3),
                })
            } else {
                Attempt::Failed(ExtractionAttempt {
                    backend: Backend::Unrar,
                    code: out.code,
                    stderr: out.stderr,
                    produced_files: produced,
                })
            }
        }
        Err(e) => Attempt::Failed(ExtractionAttempt {
            backend: Backend::Unrar,
            code: None,
            stderr: e.to_string(),
            produced_files: false,
        }),
    }
}

/// Keep the running error text from the most recent informative failure.
fn retain_error(error_text: &mut String, stderr: &str) {
    if !stderr.trim().is_empty() {
        *error_text = stderr.to_string();
    }
}

fn has_any_file(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file())
}

/// Resolve the working root inside an extraction directory.
///
/// Extractors commonly wrap the content in a single subdirectory named after
/// the archive; when the top level holds exactly one subdirectory and no
/// files, that subdirectory is the working root. Otherwise the extraction
/// directory itself is.
pub fn resolve_working_root(extraction_dir: &Path) -> PathBuf {
    let entries = match fs::read_dir(extraction_dir) {
        Ok(entries) => entries,
        Err(_) => return extraction_dir.to_path_buf(),
    };

    let mut subdirs = Vec::new();
    let mut file_count = 0;
    for entry in entries.flatten() {
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => subdirs.push(entry.path()),
            Ok(ft) if ft.is_file() => file_count += 1,
            _ => {}
        }
    }

    if subdirs.len() == 1 && file_count == 0 {
        debug!("Using wrapping subdirectory {}", subdirs[0].display());
        subdirs.remove(0)
    } else {
        extraction_dir.to_path_buf()
    }
}
