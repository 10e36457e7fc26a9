//! Runs fully substituted command strings through the system shell.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured outcome of a finished child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Everything the process wrote to stdout, lossily decoded as UTF-8.
    pub stdout: String,
    /// Everything the process wrote to stderr, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit status; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ExecutionResult {
    /// Returns `true` when the process exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Converts the outcome into the text returned to a remote caller.
    ///
    /// A successful run yields stdout, or stderr when stdout is empty. A
    /// failed run yields an error line with the exit code and stderr.
    #[must_use]
    pub fn into_response(self) -> String {
        if self.success() {
            if self.stdout.is_empty() {
                return self.stderr;
            }
            return self.stdout;
        }

        let detail = if self.stderr.trim().is_empty() {
            "Unknown error"
        } else {
            self.stderr.as_str()
        };
        format!(
            "Error executing command (exit code {}): {detail}",
            self.exit_code
        )
    }
}

/// Failures that prevent a command from producing an [`ExecutionResult`].
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The shell process could not be started.
    #[error("failed to start command: {source}")]
    Spawn {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The requested working directory does not exist.
    #[error("Working directory does not exist: {}", .path.display())]
    MissingWorkingDir {
        /// Requested directory.
        path: PathBuf,
    },

    /// The requested working directory is a file or other non-directory.
    #[error("Working directory is not a directory: {}", .path.display())]
    NotADirectory {
        /// Requested directory.
        path: PathBuf,
    },

    /// The requested working directory cannot be listed.
    #[error("Working directory is not readable: {}", .path.display())]
    UnreadableWorkingDir {
        /// Requested directory.
        path: PathBuf,
    },
}

impl ExecutionError {
    /// Formats the failure as the text returned to a remote caller.
    #[must_use]
    pub fn into_response(self) -> String {
        format!("Error: {self}")
    }
}

/// Strategy for running a command string.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion, optionally inside `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] when the process cannot be started.
    /// A non-zero exit status is not an error; it is reported through
    /// [`ExecutionResult::exit_code`].
    async fn run(
        &self,
        command: &str,
        working_dir: Option<&Path>,
    ) -> Result<ExecutionResult, ExecutionError>;
}

/// Runs commands through a shell interpreter (`sh -c` on Unix, `cmd /C` on Windows).
///
/// No timeout is applied: the call waits for the child to exit.
#[derive(Clone, Debug)]
pub struct ShellRunner {
    program: String,
    flag: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        if cfg!(windows) {
            Self::with_shell("cmd", "/C")
        } else {
            Self::with_shell("sh", "-c")
        }
    }
}

impl ShellRunner {
    /// Creates a runner using the platform shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner using a specific interpreter and its command flag.
    #[must_use]
    pub fn with_shell(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    /// Returns the interpreter program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        working_dir: Option<&Path>,
    ) -> Result<ExecutionResult, ExecutionError> {
        if let Some(dir) = working_dir {
            check_working_dir(dir).await?;
        }

        debug!(command, working_dir = ?working_dir, "executing command");

        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.flag)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| {
            warn!(command, error = %source, "failed to spawn command");
            ExecutionError::Spawn { source }
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(command, exit_code, "command finished");

        Ok(ExecutionResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}

async fn check_working_dir(dir: &Path) -> Result<(), ExecutionError> {
    let path = dir.to_path_buf();
    let metadata = match tokio::fs::metadata(dir).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ExecutionError::MissingWorkingDir { path });
        }
        Err(_) => return Err(ExecutionError::UnreadableWorkingDir { path }),
    };
    if !metadata.is_dir() {
        return Err(ExecutionError::NotADirectory { path });
    }
    if tokio::fs::read_dir(dir).await.is_err() {
        return Err(ExecutionError::UnreadableWorkingDir { path });
    }
    Ok(())
}

/// Runs `command` through `runner` and renders the outcome as text.
///
/// This never fails: spawn errors and non-zero exits both become
/// descriptive strings.
pub async fn run_to_text(
    runner: &dyn CommandRunner,
    command: &str,
    working_dir: Option<&Path>,
) -> String {
    match runner.run(command, working_dir).await {
        Ok(result) => result.into_response(),
        Err(err) => err.into_response(),
    }
}
