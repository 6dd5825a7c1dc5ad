// src/census.rs

//! Content census for directories and archives
//!
//! Verification is count-based: the number of content-bearing files in the
//! extracted tree must match the number of content entries listed inside the
//! produced archive. Directory counting walks the filesystem; archive
//! counting shells out to the family-appropriate lister (`lsar` for
//! RAR-family, `unzip -l` for ZIP-family) and parses its line-oriented
//! output.
//!
//! Listing layouts vary between lister versions, so the parsers are
//! best-effort heuristics: anything that fails to launch, exits non-zero, or
//! does not parse yields the [`UNKNOWN_COUNT`] sentinel, which callers must
//! treat as a verification failure, never trusting a partial parse.

use crate::error::{Error, Result};
use crate::sanitize::is_ignorable;
use crate::tool::run_tool;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Sentinel for "could not determine the archive's content count"
pub const UNKNOWN_COUNT: i64 = -1;

/// Archive container family, selecting the listing tool and parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// RAR-family container, listed with `lsar`
    RarFamily,
    /// ZIP-family container, listed with `unzip -l`
    ZipFamily,
}

/// Count content-bearing files under `root`, recursively.
///
/// Ignorable files (see [`crate::sanitize::is_ignorable`]) are excluded, so
/// sanitization never changes this count.
pub fn count_content(root: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::Unreadable {
            path: root.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_ignorable(&name) {
            count += 1;
        }
    }
    Ok(count)
}

/// Count content entries listed inside an archive.
///
/// Fails soft: returns [`UNKNOWN_COUNT`] on any process or parse failure.
pub fn count_archive_entries(path: &Path, kind: ArchiveKind) -> i64 {
    let output = match kind {
        ArchiveKind::RarFamily => run_tool("lsar", [path.as_os_str()], None),
        ArchiveKind::ZipFamily => {
            run_tool("unzip", [Path::new("-l").as_os_str(), path.as_os_str()], None)
        }
    };

    let output = match output {
        Ok(out) if out.success() => out,
        Ok(out) => {
            warn!(
                "Archive lister exited with {:?} for {}: {}",
                out.code,
                path.display(),
                out.stderr.trim()
            );
            return UNKNOWN_COUNT;
        }
        Err(e) => {
            warn!("Archive lister unavailable for {}: {}", path.display(), e);
            return UNKNOWN_COUNT;
        }
    };

    let count = match kind {
        ArchiveKind::RarFamily => count_rar_listing(&output.stdout),
        ArchiveKind::ZipFamily => count_zip_listing(&output.stdout),
    };
    debug!("{} lists {} content entries", path.display(), count);
    count
}

/// Entry lines in lsar output carry a size followed by an ISO date
static RAR_SIZE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s+\d{4}-\d{2}-\d{2}").unwrap());
/// Fallback: an embedded whitespace-delimited size column
static RAR_SIZE_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\d+\s+").unwrap());

/// Parse `lsar` output: header/footer lines are skipped, content lines are
/// identified by the size/date heuristics, and the final whitespace token is
/// the entry name.
fn count_rar_listing(output: &str) -> i64 {
    let mut count: i64 = 0;
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with("----")
            || trimmed.contains("Archive:")
            || trimmed.contains("Flags")
        {
            continue;
        }
        // Directory entries end with a slash
        if trimmed.ends_with('/') {
            continue;
        }
        if !RAR_SIZE_DATE.is_match(trimmed) && !RAR_SIZE_FIELD.is_match(trimmed) {
            continue;
        }
        if let Some(filename) = trimmed.split_whitespace().last() {
            if !is_ignorable(basename(filename)) {
                count += 1;
            }
        }
    }
    count
}

/// Parse `unzip -l` output: the content listing is bracketed by `------`
/// separator lines; each listing line's final whitespace token is the entry
/// name.
fn count_zip_listing(output: &str) -> i64 {
    let mut count: i64 = 0;
    let mut in_listing = false;
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("------") {
            in_listing = !in_listing;
            continue;
        }
        if !in_listing || trimmed.is_empty() {
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let filename = parts[parts.len() - 1];
        if filename.ends_with('/') {
            continue;
        }
        if !is_ignorable(basename(filename)) {
            count += 1;
        }
    }
    count
}

/// Listed entry names may carry interior path components
fn basename(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn counts_content_excluding_ignorables() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("ch1");
        std::fs::create_dir(&sub).unwrap();
        File::create(dir.path().join("page001.jpg")).unwrap();
        File::create(sub.join("page002.jpg")).unwrap();
        File::create(sub.join(".DS_Store")).unwrap();
        File::create(sub.join("Thumbs.db")).unwrap();

        assert_eq!(count_content(dir.path()).unwrap(), 2);
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let err = count_content(Path::new("/nonexistent/cbzify-census-test")).unwrap_err();
        assert!(matches!(err, Error::Unreadable { .. }));
    }

    #[test]
    fn sanitize_does_not_change_content_count() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("page001.jpg")).unwrap();
        File::create(dir.path().join(".DS_Store")).unwrap();

        let before = count_content(dir.path()).unwrap();
        crate::sanitize::sanitize(dir.path()).unwrap();
        let after = count_content(dir.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn parses_rar_listing_with_size_date_columns() {
        let listing = "\
book.cbr: RAR 5\n\
Flags  Size      Date       Time   Name\n\
-----  --------  ---------- -----  ----\n\
       1048576   2023-04-01 10:00  page001.jpg\n\
       1048576   2023-04-01 10:00  page002.jpg\n\
       0         2023-04-01 10:00  pages/\n\
       512       2023-04-01 10:00  .DS_Store\n\
-----  --------  ---------- -----  ----\n";
        assert_eq!(count_rar_listing(listing), 2);
    }

    #[test]
    fn parses_rar_listing_with_embedded_size_field() {
        let listing = "\
Archive: book.cbr\n\
0.  123456  page001.jpg\n\
1.  123456  page002.jpg\n\
2.  512  ._page001.jpg\n";
        assert_eq!(count_rar_listing(listing), 2);
    }

    #[test]
    fn rar_listing_without_entry_patterns_counts_zero() {
        let listing = "book.cbr: RAR 5\nsome banner text\n";
        assert_eq!(count_rar_listing(listing), 0);
    }

    #[test]
    fn parses_unzip_listing_between_separators() {
        let listing = "\
Archive:  book.cbz\n\
  Length      Date    Time    Name\n\
---------  ---------- -----   ----\n\
   123456  2023-04-01 10:00   page001.jpg\n\
   123456  2023-04-01 10:00   pages/\n\
   123456  2023-04-01 10:00   pages/page002.jpg\n\
      512  2023-04-01 10:00   pages/Thumbs.db\n\
---------                     -------\n\
   370944                     4 files\n";
        // Directory entry, junk entry, and the post-listing summary are all
        // excluded.
        assert_eq!(count_zip_listing(listing), 2);
    }

    #[test]
    fn empty_zip_listing_counts_zero() {
        assert_eq!(count_zip_listing(""), 0);
    }
}
