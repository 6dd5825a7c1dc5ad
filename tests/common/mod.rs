// tests/common/mod.rs

//! Shared test utilities for the pipeline integration tests.
//!
//! External archive tools are replaced by shell scripts in a private bin
//! directory, and PATH is narrowed to exactly that directory while a test
//! body runs. The scripts use only shell builtins so they work with an empty
//! PATH, and every PATH-touching test serializes on a global lock because
//! the environment is process-wide.

#![allow(dead_code)]

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

static PATH_LOCK: Mutex<()> = Mutex::new(());

/// A private bin directory of fake external tools
pub struct FakeBin {
    dir: TempDir,
}

impl FakeBin {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Install a fake tool; `body` runs under /bin/sh with the tool's
    /// arguments.
    #[cfg(unix)]
    pub fn tool(&self, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Run `f` with PATH set to only this bin directory.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = PATH_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let old = std::env::var_os("PATH").unwrap_or_default();
        let narrowed = OsString::from(self.dir.path());
        unsafe { std::env::set_var("PATH", &narrowed) };
        let result = f();
        unsafe { std::env::set_var("PATH", &old) };
        result
    }
}

/// Write a source file of `size` bytes starting with `magic`.
pub fn write_source(dir: &Path, name: &str, magic: &[u8], size: usize) -> PathBuf {
    let mut content = magic.to_vec();
    content.resize(size.max(magic.len()), 0xAA);
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A `file` fake reporting the given MIME type
pub fn file_tool_body(mime: &str, description: &str) -> String {
    format!(
        "if [ \"$2\" = \"--mime-type\" ]; then echo {}; else echo \"{}\"; fi\nexit 0",
        mime, description
    )
}

/// An `unzip` fake: `-l` prints a listing with `entries` content lines,
/// anything else (extraction mode) fails.
pub fn unzip_listing_body(entries: usize) -> String {
    let mut body = String::from(
        "if [ \"$1\" = \"-l\" ]; then\n\
         echo \"Archive:  $2\"\n\
         echo \"  Length      Date    Time    Name\"\n\
         echo \"---------  ---------- -----   ----\"\n",
    );
    for i in 1..=entries {
        body.push_str(&format!(
            "echo \"      111  2023-01-01 00:00   page{}.jpg\"\n",
            i
        ));
    }
    body.push_str(
        "echo \"---------                     -------\"\n\
         echo \"      333                     entries\"\n\
         exit 0\n\
         fi\n\
         exit 1",
    );
    body
}

/// Assert that no leftover temp directory remains beside the source.
pub fn assert_no_temp_dirs(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("_tmp_"))
        .collect();
    assert!(
        leftovers.is_empty(),
        "temp directories left behind: {:?}",
        leftovers
    );
}
