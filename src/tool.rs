// src/tool.rs

//! External tool invocation
//!
//! All archive tools (unar, unrar, 7z, unzip, zip, lsar, file, gio) are run
//! through [`run_tool`]: arguments are passed as a vector to the spawn
//! primitive (no shell interpretation), stdin is nullified to prevent hangs,
//! stdout/stderr are captured, and a watchdog kills any tool that exceeds
//! the timeout so a wedged extractor cannot block its worker forever.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Watchdog timeout for a single tool invocation (5 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Captured result of one tool invocation
#[derive(Debug)]
pub struct ToolOutput {
    /// Exit code; `None` when the tool was killed by a signal or the watchdog
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// True for a clean zero exit
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run a tool to completion with the default watchdog timeout.
pub fn run_tool<I, S>(tool: &'static str, args: I, cwd: Option<&Path>) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tool_with_timeout(tool, args, cwd, DEFAULT_TIMEOUT)
}

/// Run a tool to completion, killing it if the watchdog expires.
///
/// A launch failure (binary not on PATH) is an [`Error::ToolLaunch`]; the
/// caller folds it into the relevant stage's failure. A watchdog kill is
/// reported as a normal [`ToolOutput`] with `code: None` and an explanatory
/// stderr so it flows through the same failure path as a non-zero exit.
pub fn run_tool_with_timeout<I, S>(
    tool: &'static str,
    args: I,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(tool);
    command
        .args(args)
        .stdin(Stdio::null()) // CRITICAL: prevent stdin hangs
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| Error::ToolLaunch { tool, source: e })?;

    // Drain both pipes on reader threads while the tool runs. Listing a
    // large archive produces more output than the OS pipe buffer holds, and
    // a tool blocked on a full pipe never exits, so waiting before reading
    // would turn every such run into a watchdog kill.
    let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
    let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

    match child.wait_timeout(timeout)? {
        Some(status) => {
            debug!("{} exited with {:?}", tool, status.code());
            Ok(ToolOutput {
                code: status.code(),
                stdout: collect_pipe(stdout_reader),
                stderr: collect_pipe(stderr_reader),
            })
        }
        None => {
            warn!("{} exceeded {}s watchdog, killing", tool, timeout.as_secs());
            child.kill()?;
            child.wait()?;
            // The kill closes the pipes; the readers see EOF and finish
            let _ = collect_pipe(stdout_reader);
            let _ = collect_pipe(stderr_reader);
            Ok(ToolOutput {
                code: None,
                stdout: String::new(),
                stderr: format!("{} killed after exceeding {}s watchdog", tool, timeout.as_secs()),
            })
        }
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        let _ = pipe.read_to_string(&mut buffer);
        buffer
    })
}

fn collect_pipe(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_launch_error_not_panic() {
        let result = run_tool("cbzify-no-such-tool-on-any-host", ["--version"], None);
        match result {
            Err(Error::ToolLaunch { tool, .. }) => {
                assert_eq!(tool, "cbzify-no-such-tool-on-any-host")
            }
            other => panic!("expected ToolLaunch error, got {:?}", other.map(|o| o.code)),
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_output() {
        let out = run_tool("sh", ["-c", "echo hi; echo oops >&2; exit 3"], None).unwrap();
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn large_output_is_drained_without_stalling_the_watchdog() {
        // Roughly 1 MB of stdout, well past the OS pipe buffer; the tool
        // must still exit cleanly inside a short timeout
        let out = run_tool_with_timeout(
            "sh",
            [
                "-c",
                "i=0; while [ $i -lt 20000 ]; do \
                 echo 0123456789012345678901234567890123456789012345678; \
                 i=$((i+1)); done",
            ],
            None,
            Duration::from_secs(3),
        )
        .unwrap();
        assert_eq!(out.code, Some(0));
        assert!(out.stdout.len() > 500_000);
    }

    #[cfg(unix)]
    #[test]
    fn watchdog_kills_hung_tool() {
        let out = run_tool_with_timeout(
            "sh",
            ["-c", "sleep 30"],
            None,
            Duration::from_millis(100),
        )
        .unwrap();
        assert_eq!(out.code, None);
        assert!(out.stderr.contains("watchdog"));
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_requested_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_tool("pwd", std::iter::empty::<&str>(), Some(dir.path())).unwrap();
        assert!(out.success());
        let reported = std::path::PathBuf::from(out.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
