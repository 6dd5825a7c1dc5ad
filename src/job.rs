// src/job.rs

//! Per-file conversion job
//!
//! A job owns one source file and drives it through the pipeline:
//! extract -> normalize -> census(source) -> sanitize -> repackage ->
//! census(dest) -> verify. Every terminal path releases the job's private
//! temp directory, and a destination archive only survives when its content
//! count matches the extracted source exactly.

use crate::batch::{ConvertObserver, JobEvent};
use crate::census::{self, ArchiveKind};
use crate::diagnose::{self, FormatDiagnosis};
use crate::extract::{self, Backend, ChainOutcome};
use crate::repack;
use crate::sanitize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sources under this size are failed-download placeholders, skipped without
/// invoking any extraction tool.
pub const MIN_SOURCE_BYTES: u64 = 1024;

/// Terminal outcome of one conversion job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Verified conversion: destination count equals source count (> 0)
    Success {
        pages: usize,
        backend: Backend,
        /// Content was recovered past CRC errors; pages may be damaged
        crc_warnings: bool,
    },
    /// Source under [`MIN_SOURCE_BYTES`]; skipped, not an error
    TooSmall { size: u64 },
    /// Every extraction strategy was exhausted
    ExtractFailed {
        error_text: String,
        diagnosis: FormatDiagnosis,
    },
    /// Extraction produced no content-bearing files
    EmptySource,
    /// The packaging tool failed
    RepackageFailed { error: String },
    /// Destination count differed from source count; the destination
    /// archive was deleted
    CountMismatch { source_count: usize, dest_count: i64 },
    /// Filesystem-level failure (temp dir creation, unreadable tree, ...)
    Failed { error: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// TooSmall is a skip, distinct from both success and failure
    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::TooSmall { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::TooSmall { .. } => "too-small",
            Outcome::ExtractFailed { .. } => "extract-failed",
            Outcome::EmptySource => "empty-source",
            Outcome::RepackageFailed { .. } => "repackage-failed",
            Outcome::CountMismatch { .. } => "count-mismatch",
            Outcome::Failed { .. } => "failed",
        }
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        match self {
            Outcome::Success {
                pages,
                backend,
                crc_warnings,
            } => {
                if *crc_warnings {
                    format!("verified {} pages via {} (CRC warnings)", pages, backend)
                } else {
                    format!("verified {} pages via {}", pages, backend)
                }
            }
            Outcome::TooSmall { size } => format!(
                "skipped: {} bytes, likely a failed-download placeholder",
                size
            ),
            Outcome::ExtractFailed { .. } => "all extraction methods failed".to_string(),
            Outcome::EmptySource => "no content found after extraction".to_string(),
            Outcome::RepackageFailed { error } => format!("packaging failed: {}", error),
            Outcome::CountMismatch {
                source_count,
                dest_count,
            } => format!(
                "page count mismatch: extracted {} but archive lists {}",
                source_count, dest_count
            ),
            Outcome::Failed { error } => error.clone(),
        }
    }
}

/// One source file's trip through the pipeline
#[derive(Debug, Clone)]
pub struct ConversionJob {
    source: PathBuf,
    dest: PathBuf,
}

impl ConversionJob {
    /// The destination is the source basename with a `.cbz` extension, in
    /// the source's directory. A pre-existing destination is replaced, never
    /// merged into; re-running on an untouched source reproduces the same
    /// outcome.
    pub fn new(source: PathBuf) -> Self {
        let dest = source.with_extension("cbz");
        Self { source, dest }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Run the job to a terminal outcome. Failures never propagate out;
    /// everything is folded into the returned [`Outcome`].
    pub fn run(&self, observer: &dyn ConvertObserver) -> Outcome {
        observer.on_event(&self.source, JobEvent::Started);
        let outcome = self.run_pipeline(observer);
        observer.on_event(
            &self.source,
            JobEvent::Finished {
                success: outcome.is_success(),
                summary: outcome.summary(),
            },
        );
        outcome
    }

    fn run_pipeline(&self, observer: &dyn ConvertObserver) -> Outcome {
        let size = match fs::metadata(&self.source) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Outcome::Failed {
                    error: format!("cannot stat source: {}", e),
                };
            }
        };
        if size < MIN_SOURCE_BYTES {
            return Outcome::TooSmall { size };
        }

        // Private temp directory, a sibling of the source; the random suffix
        // keeps concurrent jobs from ever sharing a path, and RAII removes
        // it on every exit path below.
        let parent = self.source.parent().unwrap_or(Path::new("."));
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cbr".to_string());
        let temp = match tempfile::Builder::new()
            .prefix(&format!("{}_tmp_", stem))
            .tempdir_in(parent)
        {
            Ok(temp) => temp,
            Err(e) => {
                return Outcome::Failed {
                    error: format!("cannot create temp directory: {}", e),
                };
            }
        };

        observer.on_event(&self.source, JobEvent::Extracting);
        let (backend, crc_warnings) = match extract::extract(&self.source, temp.path()) {
            ChainOutcome::Extracted {
                backend,
                crc_warnings,
            } => (backend, crc_warnings),
            ChainOutcome::Failed {
                error_text,
                attempts,
            } => {
                for attempt in &attempts {
                    debug!(
                        "{}: {} exited {:?} (files produced: {})",
                        self.source.display(),
                        attempt.backend,
                        attempt.code,
                        attempt.produced_files
                    );
                }
                let diagnosis = diagnose::diagnose(&self.source, &error_text);
                return Outcome::ExtractFailed {
                    error_text,
                    diagnosis,
                };
            }
        };
        observer.on_event(
            &self.source,
            JobEvent::Extracted {
                backend,
                crc_warnings,
            },
        );

        let working_root = extract::resolve_working_root(temp.path());

        let source_count = match census::count_content(&working_root) {
            Ok(count) => count,
            Err(e) => {
                return Outcome::Failed {
                    error: format!("cannot count extracted pages: {}", e),
                };
            }
        };
        if source_count == 0 {
            return Outcome::EmptySource;
        }
        observer.on_event(&self.source, JobEvent::PagesCounted { pages: source_count });

        match sanitize::sanitize(&working_root) {
            Ok(removed) if removed > 0 => {
                observer.on_event(&self.source, JobEvent::Sanitized { removed });
            }
            Ok(_) => {}
            Err(e) => {
                return Outcome::Failed {
                    error: format!("cannot clean system files: {}", e),
                };
            }
        }

        observer.on_event(&self.source, JobEvent::Repackaging);
        if self.dest.exists() {
            // zip -r merges into an existing archive; a stale destination
            // must go first or verification would count stale members
            if let Err(e) = fs::remove_file(&self.dest) {
                return Outcome::Failed {
                    error: format!("cannot remove stale destination: {}", e),
                };
            }
        }
        if let Err(error) = repack::repackage(&working_root, &self.dest) {
            if self.dest.exists() {
                if let Err(e) = fs::remove_file(&self.dest) {
                    warn!(
                        "{}: could not remove partial destination {}: {}",
                        self.source.display(),
                        self.dest.display(),
                        e
                    );
                }
            }
            return Outcome::RepackageFailed { error };
        }

        observer.on_event(&self.source, JobEvent::Verifying);
        let dest_count = census::count_archive_entries(&self.dest, ArchiveKind::ZipFamily);
        if dest_count != source_count as i64 {
            warn!(
                "{}: page count mismatch ({} extracted, {} listed), removing destination",
                self.source.display(),
                source_count,
                dest_count
            );
            if let Err(e) = fs::remove_file(&self.dest) {
                warn!(
                    "{}: could not remove mismatched destination {}: {}",
                    self.source.display(),
                    self.dest.display(),
                    e
                );
            }
            return Outcome::CountMismatch {
                source_count,
                dest_count,
            };
        }

        Outcome::Success {
            pages: source_count,
            backend,
            crc_warnings,
        }
    }
}
