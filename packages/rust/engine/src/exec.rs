//! Cancellable subprocess execution.
//!
//! Every external process the engine runs (runtime probe, git clone,
//! containerized steps) goes through [`run_command`], which races the child
//! against the invocation's cancellation token and kills it on cancel.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a command did not produce a successful exit.
#[derive(Debug)]
pub(crate) enum RunError {
    /// The process could not be spawned at all.
    Spawn(std::io::Error),
    /// The process exited with a non-zero status.
    Failed {
        status: Option<i32>,
        stderr: String,
    },
    /// The invocation was cancelled while the process was running.
    Cancelled,
}

impl RunError {
    /// Human-readable failure description for error mapping at call sites.
    pub(crate) fn message(&self) -> String {
        match self {
            Self::Spawn(e) => format!("failed to spawn process: {e}"),
            Self::Failed { status, stderr } => {
                let status = status.map_or_else(|| "killed by signal".into(), |c| c.to_string());
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("exit status {status}")
                } else {
                    format!("exit status {status}: {stderr}")
                }
            }
            Self::Cancelled => "cancelled".into(),
        }
    }
}

/// Captured output of a successful command.
#[derive(Debug)]
pub(crate) struct RunOutput {
    pub stdout: String,
}

/// Run `program` with `args`, waiting for exit or cancellation.
///
/// With `verbose` set, the child's stderr is passed through to the parent's
/// so transport-level output (git progress, container runtime logs) is
/// visible; otherwise stderr is captured and surfaced only on failure.
pub(crate) async fn run_command<I, S>(
    cancel: &CancellationToken,
    program: &str,
    args: I,
    cwd: Option<&Path>,
    verbose: bool,
) -> std::result::Result<RunOutput, RunError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(if verbose {
            Stdio::inherit()
        } else {
            Stdio::piped()
        })
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(program, "spawning subprocess");

    let child = cmd.spawn().map_err(RunError::Spawn)?;

    let output = tokio::select! {
        _ = cancel.cancelled() => {
            // Dropping the child kills it via kill_on_drop.
            return Err(RunError::Cancelled);
        }
        output = child.wait_with_output() => output.map_err(RunError::Spawn)?,
    };

    if !output.status.success() {
        return Err(RunError::Failed {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(RunOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}
