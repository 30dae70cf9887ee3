//! External command execution with a testable seam.
//!
//! The composition engine and the duration probe run ffmpeg/ffprobe through
//! [`CommandExecutor`]; tests substitute [`ScriptedExecutor`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    #[error("permission denied executing {program}")]
    PermissionDenied { program: String },

    #[error("failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Outcome of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for running external programs.
///
/// A non-zero exit is a normal [`CommandOutput`]; only failing to run the
/// program at all is an [`ExecError`].
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError>;
}

/// Production executor backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExecError::NotFound {
                    program: program.to_string(),
                },
                std::io::ErrorKind::PermissionDenied => ExecError::PermissionDenied {
                    program: program.to_string(),
                },
                _ => ExecError::Spawn {
                    program: program.to_string(),
                    message: e.to_string(),
                },
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::TimedOut {
                program: program.to_string(),
                timeout,
            })?
            .map_err(|e| ExecError::Spawn {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            status_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// One recorded invocation of a [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

/// Scripted executor for testing
///
/// Records every call and answers with a configured outcome. On success it
/// writes `output_bytes` to the path in the last argument, which is where
/// ffmpeg puts its output file.
#[derive(Debug)]
pub struct ScriptedExecutor {
    exit_code: i32,
    stdout: String,
    stderr: String,
    output_bytes: Option<Vec<u8>>,
    missing_program: bool,
    times_out: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            output_bytes: Some(b"ID3mixed-meditation".to_vec()),
            missing_program: false,
            times_out: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedExecutor {
    /// Exits 0 and writes a small placeholder output file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code`, printing `stderr`. Writes no output file.
    pub fn with_exit(mut self, code: i32, stderr: &str) -> Self {
        self.exit_code = code;
        self.stderr = stderr.to_string();
        self.output_bytes = None;
        self
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    /// Exit 0 without producing the output file.
    pub fn without_output(mut self) -> Self {
        self.output_bytes = None;
        self
    }

    /// Behave as if the program is not installed.
    pub fn with_missing_program(mut self) -> Self {
        self.missing_program = true;
        self
    }

    /// Leave a truncated output file behind and report a timeout, as a
    /// process killed mid-write would.
    pub fn with_timeout(mut self) -> Self {
        self.times_out = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                program: program.to_string(),
                args: args.to_vec(),
            });
        }

        if self.missing_program {
            return Err(ExecError::NotFound {
                program: program.to_string(),
            });
        }

        let success = self.exit_code == 0;
        if (success || self.times_out)
            && let Some(bytes) = &self.output_bytes
            && let Some(target) = args.last()
        {
            let written = if self.times_out {
                &bytes[..bytes.len() / 2]
            } else {
                &bytes[..]
            };
            write_output(program, &PathBuf::from(target), written).await?;
        }

        if self.times_out {
            return Err(ExecError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }

        Ok(CommandOutput {
            status_code: Some(self.exit_code),
            success,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }
}

async fn write_output(program: &str, target: &Path, bytes: &[u8]) -> Result<(), ExecError> {
    let spawn_error = |e: std::io::Error| ExecError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
    };
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(spawn_error)?;
    }
    tokio::fs::write(target, bytes).await.map_err(spawn_error)
}
