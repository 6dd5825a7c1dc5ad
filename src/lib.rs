// src/lib.rs

//! cbzify - batch CBR to CBZ comic archive conversion
//!
//! Converts RAR-family comic archives into ZIP-family archives, never
//! leaving a destination in place unless its content count is verified
//! equal to the extracted source.
//!
//! # Architecture
//!
//! - Multi-strategy extraction: unar, then lenient unrar, then 7z, then
//!   unzip, stopping at the first backend with evidence of content
//! - Count-based verification: pages counted in the extracted tree must
//!   match the entries listed inside the produced archive
//! - Corruption diagnostics: on total extraction failure the source's byte
//!   signature, detected type, and MIME type classify the likely cause
//! - Bounded worker pool: one job per file, fully isolated, outcomes
//!   returned by value to the orchestrator

pub mod batch;
pub mod census;
pub mod detect;
pub mod diagnose;
mod error;
pub mod extract;
pub mod job;
pub mod repack;
pub mod sanitize;
pub mod tool;
pub mod trash;

pub use batch::{run_batch, BatchResult, ConvertObserver, JobEvent, LogObserver, NullObserver};
pub use census::{count_archive_entries, count_content, ArchiveKind, UNKNOWN_COUNT};
pub use diagnose::{diagnose, Classification, FormatDiagnosis, RarFailure};
pub use error::{Error, Result};
pub use extract::{extract, resolve_working_root, Backend, ChainOutcome, ExtractionAttempt};
pub use job::{ConversionJob, Outcome, MIN_SOURCE_BYTES};
pub use sanitize::{is_ignorable, sanitize};
