// src/diagnose.rs

//! Failure diagnostics
//!
//! When every extraction backend fails, the source file's leading bytes,
//! detected type, and MIME type are inspected to tell the user *why*:
//! zeroed-out download placeholder, encrypted or CRC-damaged RAR, mislabeled
//! ZIP, or something unrecognized. Advisory only; the diagnosis never
//! changes the job outcome.

use crate::detect::{self, RAR_MAGIC, ZIP_MAGIC, format_signature, read_signature};
use std::fmt;
use std::fs;
use std::path::Path;

/// Why a structurally-valid RAR failed to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RarFailure {
    /// Error text mentioned "password" or "encrypted"
    PasswordProtected,
    /// Error text mentioned "checksum" or "CRC"
    CrcCorruption,
    /// No recognizable reason, possibly a corrupted header
    UnknownHeader,
}

/// Classification of an unextractable source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Leading 8 bytes are all zero: likely disk or download corruption
    Zeroed,
    /// Valid RAR signature but extraction failed
    ValidRarSignature(RarFailure),
    /// Valid ZIP signature but extraction failed
    ValidZipSignature,
    /// Signature matches no known container
    Unknown,
}

/// Reference table of known magic sequences, included in every report to
/// aid manual inspection of unclassified signatures.
pub const KNOWN_MAGIC: &[(&str, &str)] = &[
    ("RAR", "52 61 72 21 1A 07"),
    ("ZIP", "50 4B 03 04"),
    ("7z", "37 7A BC AF 27 1C"),
];

/// Structured report for one unextractable source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDiagnosis {
    /// `file -b` output, verbatim
    pub detected_type: String,
    /// `file -b --mime-type` output, verbatim
    pub mime_type: String,
    /// First 16 bytes as uppercase space-separated hex
    pub hex_signature: String,
    pub size_bytes: u64,
    pub classification: Classification,
    /// Last extraction error text, trimmed; empty when none was captured
    pub extract_error: String,
    pub suggestion: &'static str,
}

/// Classify a source's leading bytes, using the last extraction error text
/// to subdivide RAR failures.
///
/// The error scan is case-sensitive on purpose: "CRC" is how the tools spell
/// it, and "password"/"encrypted" appear lowercase in unrar output.
pub fn classify(signature: &[u8], last_error: &str) -> Classification {
    if signature.len() >= 8 && signature[..8].iter().all(|&b| b == 0) {
        return Classification::Zeroed;
    }
    if signature.starts_with(&RAR_MAGIC) {
        let reason = if last_error.contains("password") || last_error.contains("encrypted") {
            RarFailure::PasswordProtected
        } else if last_error.contains("checksum") || last_error.contains("CRC") {
            RarFailure::CrcCorruption
        } else {
            RarFailure::UnknownHeader
        };
        return Classification::ValidRarSignature(reason);
    }
    if signature.starts_with(&ZIP_MAGIC) {
        return Classification::ValidZipSignature;
    }
    Classification::Unknown
}

fn suggestion_for(classification: Classification) -> &'static str {
    match classification {
        Classification::Zeroed => {
            "File is completely zeroed; re-download from the original source"
        }
        Classification::ValidRarSignature(RarFailure::PasswordProtected) => {
            "Archive is password protected or encrypted; obtain an unprotected copy"
        }
        Classification::ValidRarSignature(RarFailure::CrcCorruption) => {
            "Archive has CRC/checksum damage; re-download from the original source"
        }
        Classification::ValidRarSignature(RarFailure::UnknownHeader) => {
            "RAR header may be corrupted; re-download from the original source"
        }
        Classification::ValidZipSignature => {
            "ZIP container could not be extracted; re-download from the original source"
        }
        Classification::Unknown => {
            "File may be corrupted, encrypted, or have a non-standard wrapper; \
             re-download from the original source"
        }
    }
}

/// Build the full diagnosis for a source whose extraction chain was
/// exhausted.
pub fn diagnose(source: &Path, last_error: &str) -> FormatDiagnosis {
    let signature = read_signature(source).unwrap_or_default();
    let classification = classify(&signature, last_error);
    FormatDiagnosis {
        detected_type: detect::detected_type(source),
        mime_type: detect::mime_type(source),
        hex_signature: format_signature(&signature),
        size_bytes: fs::metadata(source).map(|m| m.len()).unwrap_or(0),
        classification,
        extract_error: last_error.trim().to_string(),
        suggestion: suggestion_for(classification),
    }
}

impl fmt::Display for FormatDiagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== FILE FORMAT ANALYSIS =====")?;
        writeln!(f, "Size: {} KB", self.size_bytes / 1024)?;
        writeln!(f, "Detected type: {}", self.detected_type)?;
        writeln!(f, "MIME type: {}", self.mime_type)?;
        writeln!(f, "Hex signature: {}", self.hex_signature)?;
        let analysis = match self.classification {
            Classification::Zeroed => "file is completely zeroed, likely corruption".to_string(),
            Classification::ValidRarSignature(reason) => format!(
                "valid RAR signature but extraction failed ({})",
                match reason {
                    RarFailure::PasswordProtected => "password protected / encrypted",
                    RarFailure::CrcCorruption => "CRC/checksum errors, file corruption",
                    RarFailure::UnknownHeader => "unknown, possibly corrupted header",
                }
            ),
            Classification::ValidZipSignature => {
                "valid ZIP signature but extraction failed".to_string()
            }
            Classification::Unknown => "signature matches no known container".to_string(),
        };
        writeln!(f, "Analysis: {}", analysis)?;
        if !self.extract_error.is_empty() {
            writeln!(f, "Extraction error: {}", self.extract_error)?;
        }
        writeln!(f, "Known format signatures:")?;
        for (name, magic) in KNOWN_MAGIC {
            writeln!(f, "  {:4} {}", format!("{}:", name), magic)?;
        }
        write!(f, "Suggestion: {}", self.suggestion)
    }
}
