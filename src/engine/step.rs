//! Step runner
//!
//! Runs one external command and classifies the outcome. The expected output
//! artifact doubles as the memoization marker: when it already exists the
//! command is skipped entirely and the step reports `AlreadyDone`. Presence
//! of the output, not a content hash, is the cache key.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::result::{StepResult, StepStatus};

/// Which stream carries the tool's diagnostics.
///
/// Most wrapped tools write errors to stderr; AGAT and InterProScan report
/// theirs on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticStream {
    #[default]
    Stderr,
    Stdout,
}

/// Per-invocation options for [`run_step`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory for the child process. Tools like TEsorter and the
    /// LTR_retriever family write outputs relative to their cwd; setting it
    /// on the child leaves the parent process directory untouched, so later
    /// stages always resolve paths from the same place.
    pub workdir: Option<PathBuf>,
    pub diagnostics: DiagnosticStream,
}

impl RunOptions {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn stdout_diagnostics() -> Self {
        Self {
            diagnostics: DiagnosticStream::Stdout,
            ..Self::default()
        }
    }
}

/// Run `command` through the shell unless `expected_output` already exists.
///
/// A nonzero exit becomes `Failed` with the captured diagnostic text; the
/// failure is reported upward, never raised here.
pub async fn run_step(command: &str, expected_output: &Path, options: &RunOptions) -> StepResult {
    if expected_output.exists() {
        debug!(output = %expected_output.display(), "artifact exists, skipping");
        return StepResult {
            command: command.to_string(),
            status: StepStatus::AlreadyDone(format!(
                "File {} already exists",
                expected_output.display()
            )),
            output: Some(expected_output.to_path_buf()),
        };
    }

    info!(command, "running step");
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = &options.workdir {
        cmd.current_dir(dir);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let status = match cmd.output().await {
        Ok(output) => {
            let diagnostics = match options.diagnostics {
                DiagnosticStream::Stderr => String::from_utf8_lossy(&output.stderr).to_string(),
                DiagnosticStream::Stdout => String::from_utf8_lossy(&output.stdout).to_string(),
            };
            if output.status.success() {
                StepStatus::Success("run successfully".to_string())
            } else {
                StepStatus::Failed(format!(
                    "Failed with exit code {}: \n {}",
                    output.status.code().unwrap_or(-1),
                    diagnostics.trim_end()
                ))
            }
        }
        Err(e) => StepStatus::Failed(format!("Failed to spawn command: {}", e)),
    };

    StepResult {
        command: command.to_string(),
        status,
        output: Some(expected_output.to_path_buf()),
    }
}

/// Build a [`StepResult`] for a step implemented in-process rather than as a
/// subprocess (annotation rewriting, FASTA filtering, summary merging).
/// The same exists-check applies so internal steps memoize like external
/// ones.
pub fn internal_step<F>(description: &str, expected_output: &Path, produce: F) -> StepResult
where
    F: FnOnce() -> std::io::Result<()>,
{
    if expected_output.exists() {
        return StepResult {
            command: description.to_string(),
            status: StepStatus::AlreadyDone(format!(
                "File {} already exists",
                expected_output.display()
            )),
            output: Some(expected_output.to_path_buf()),
        };
    }

    let status = match produce() {
        Ok(()) => StepStatus::Success("run successfully".to_string()),
        Err(e) => StepStatus::Failed(format!("Failed: \n {}", e)),
    };

    StepResult {
        command: description.to_string(),
        status,
        output: Some(expected_output.to_path_buf()),
    }
}
