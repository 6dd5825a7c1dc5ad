// src/batch.rs

//! Batch orchestration
//!
//! A bounded rayon pool runs one [`ConversionJob`] per worker at a time over
//! the queued file list. Outcomes travel back as the parallel map's return
//! values, one result slot per input index, so there is no shared mutable
//! success list and no lock. Jobs are fully isolated: one failure never
//! aborts or affects its siblings, and the batch result is only assembled
//! once every worker has finished.

use crate::error::Result;
use crate::extract::Backend;
use crate::job::{ConversionJob, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Lifecycle events emitted synchronously by workers.
///
/// The observer is the seam between the pipeline and any presentation layer;
/// implementations that talk to a UI are responsible for their own
/// cross-thread marshaling. Events from different workers interleave and are
/// tagged by source path.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Started,
    Extracting,
    Extracted { backend: Backend, crc_warnings: bool },
    PagesCounted { pages: usize },
    Sanitized { removed: usize },
    Repackaging,
    Verifying,
    Finished { success: bool, summary: String },
}

/// Observer for job lifecycle events; implementations must tolerate
/// concurrent invocation from multiple workers.
pub trait ConvertObserver: Send + Sync {
    fn on_event(&self, source: &Path, event: JobEvent);
}

/// No-op observer for tests and embedding
pub struct NullObserver;

impl ConvertObserver for NullObserver {
    fn on_event(&self, _source: &Path, _event: JobEvent) {}
}

/// Logs every event through tracing, tagged with the source basename
pub struct LogObserver;

impl ConvertObserver for LogObserver {
    fn on_event(&self, source: &Path, event: JobEvent) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        match event {
            JobEvent::Started => info!("[{}] processing", name),
            JobEvent::Extracting => info!("[{}] extracting", name),
            JobEvent::Extracted {
                backend,
                crc_warnings,
            } => {
                if crc_warnings {
                    warn!("[{}] extracted via {} with CRC errors", name, backend);
                } else {
                    info!("[{}] extracted via {}", name, backend);
                }
            }
            JobEvent::PagesCounted { pages } => info!("[{}] found {} page(s)", name, pages),
            JobEvent::Sanitized { removed } => {
                info!("[{}] removed {} system file(s)", name, removed)
            }
            JobEvent::Repackaging => info!("[{}] creating CBZ", name),
            JobEvent::Verifying => info!("[{}] verifying page count", name),
            JobEvent::Finished { success, summary } => {
                if success {
                    info!("[{}] SUCCESS: {}", name, summary);
                } else {
                    warn!("[{}] {}", name, summary);
                }
            }
        }
    }
}

/// Drives an indicatif bar across the batch, one tick per finished job
#[derive(Clone)]
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConvertObserver for ProgressObserver {
    fn on_event(&self, source: &Path, event: JobEvent) {
        if let JobEvent::Finished { .. } = event {
            if let Some(name) = source.file_name() {
                self.bar.set_message(name.to_string_lossy().into_owned());
            }
            self.bar.inc(1);
        }
    }
}

/// Fan events out to several observers (typically log + progress)
pub struct CompositeObserver {
    observers: Vec<Box<dyn ConvertObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Box<dyn ConvertObserver>>) -> Self {
        Self { observers }
    }
}

impl ConvertObserver for CompositeObserver {
    fn on_event(&self, source: &Path, event: JobEvent) {
        for observer in &self.observers {
            observer.on_event(source, event.clone());
        }
    }
}

/// Aggregate result over all jobs, in input order
#[derive(Debug)]
pub struct BatchResult {
    outcomes: Vec<(PathBuf, Outcome)>,
}

impl BatchResult {
    pub fn outcomes(&self) -> &[(PathBuf, Outcome)] {
        &self.outcomes
    }

    /// Source paths whose conversion was verified; the only paths eligible
    /// for origin disposal.
    pub fn successful_paths(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(path, _)| path.as_path())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_success())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_skip()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_success() && !o.is_skip())
            .count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Default worker count: the logical CPU count
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Filter candidate paths into the conversion queue.
///
/// Accepted: existing regular files with a case-insensitive `.cbr`
/// extension, deduplicated by canonical absolute path, input order
/// preserved. Returns the queue plus the rejects with reasons.
pub fn queue_files(candidates: &[PathBuf]) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
    let mut queue = Vec::new();
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for candidate in candidates {
        let is_cbr = candidate
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("cbr"))
            .unwrap_or(false);
        if !is_cbr {
            rejected.push((candidate.clone(), "not a .cbr file".to_string()));
            continue;
        }
        match candidate.canonicalize() {
            Ok(canonical) => {
                if !canonical.is_file() {
                    rejected.push((candidate.clone(), "not a regular file".to_string()));
                    continue;
                }
                if seen.insert(canonical.clone()) {
                    queue.push(canonical);
                }
                // Duplicates are silently dropped, not rejected
            }
            Err(e) => {
                rejected.push((candidate.clone(), format!("cannot resolve: {}", e)));
            }
        }
    }

    (queue, rejected)
}

/// Run the whole batch on a pool of exactly `concurrency` workers.
pub fn run_batch(
    paths: &[PathBuf],
    concurrency: usize,
    observer: &dyn ConvertObserver,
) -> Result<BatchResult> {
    let concurrency = concurrency.max(1);
    info!(
        "Converting {} file(s) with {} worker(s)",
        paths.len(),
        concurrency
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .build()
        .map_err(|e| std::io::Error::other(e))?;

    let outcomes: Vec<(PathBuf, Outcome)> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let job = ConversionJob::new(path.clone());
                let outcome = job.run(observer);
                (path.clone(), outcome)
            })
            .collect()
    });

    Ok(BatchResult { outcomes })
}
