use async_trait::async_trait;
use futures::stream::Stream;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::error::ProcessError;
use crate::command::join_command;

/// Variables copied from the parent when present. `PATH` is handled separately.
const INHERITED_VARS: [&str; 5] = ["HOME", "USER", "TMPDIR", "LANG", "LC_ALL"];

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    /// The only variables the child sees besides `PATH` and [`INHERITED_VARS`]
    pub env: BTreeMap<String, String>,
}

impl ProcessCommand {
    /// Shell-quoted rendering of the full command line, for logs and error messages
    pub fn command_line(&self) -> String {
        join_command(std::iter::once(&self.program).chain(&self.args))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            return ExitStatus::Success;
        }
        if let Some(code) = status.code() {
            return ExitStatus::Error(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signal(signal);
            }
        }
        ExitStatus::Error(1)
    }
}

pub type ProcessStreamItem = Result<String, ProcessError>;
pub type ProcessStreamFut = Pin<Box<dyn Stream<Item = ProcessStreamItem> + Send>>;
pub type ProcessStatusFut = Pin<Box<dyn futures::Future<Output = Result<ExitStatus, ProcessError>> + Send>>;

/// A running process: its output as lines and its eventual exit status
pub struct ProcessStream {
    pub stdout: ProcessStreamFut,
    pub stderr: ProcessStreamFut,
    pub status: ProcessStatusFut,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError>;
}

/// Spawns real processes with tokio
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn build(command: &ProcessCommand) -> Result<tokio::process::Command, ProcessError> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args).env_clear();

        match std::env::var("PATH") {
            Ok(path) => {
                cmd.env("PATH", path);
            }
            Err(_) if !command.env.contains_key("PATH") => {
                return Err(ProcessError::MissingPath {
                    program: command.program.clone(),
                });
            }
            Err(_) => {}
        }
        for var in INHERITED_VARS {
            if let Ok(value) = std::env::var(var) {
                cmd.env(var, value);
            }
        }
        cmd.envs(&command.env);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }

    fn spawn(command: &ProcessCommand) -> Result<tokio::process::Child, ProcessError> {
        tracing::info!("Executing command: {}", command.command_line());
        tracing::trace!("Environment: {:?}", command.env);

        Self::build(command)?.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProcessError::CommandNotFound(command.program.clone())
            } else {
                ProcessError::SpawnFailed {
                    command: command.command_line(),
                    source,
                }
            }
        })
    }

    /// Lines of `reader` with the trailing newline (and carriage return) removed
    fn lines<R>(reader: R, command_line: String) -> ProcessStreamFut
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Box::pin(futures::stream::unfold(
            (BufReader::new(reader), command_line, false),
            |(mut reader, command_line, failed)| async move {
                if failed {
                    return None;
                }
                let mut line = String::new();
                match reader.read_line(&mut line).await {
                    Ok(0) => None,
                    Ok(_) => {
                        let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
                        Some((Ok(trimmed), (reader, command_line, false)))
                    }
                    Err(source) => {
                        let err = ProcessError::Output {
                            command: command_line.clone(),
                            source,
                        };
                        Some((Err(err), (reader, command_line, true)))
                    }
                }
            },
        ))
    }

    fn uncaptured(command_line: &str, stream: &str) -> ProcessError {
        ProcessError::Output {
            command: command_line.to_string(),
            source: std::io::Error::other(format!("{} was not captured", stream)),
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = Instant::now();
        let child = Self::spawn(&command)?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ProcessError::Output {
                command: command.command_line(),
                source,
            })?;

        let result = ProcessOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };
        match result.status.code() {
            Some(code) => tracing::debug!("Command return code: {} ({:?})", code, result.duration),
            None => tracing::warn!(
                "{} terminated by {:?} after {:?}",
                command.program,
                result.status,
                result.duration
            ),
        }
        Ok(result)
    }

    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        let mut child = Self::spawn(&command)?;
        let command_line = command.command_line();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Self::uncaptured(&command_line, "stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Self::uncaptured(&command_line, "stderr"))?;

        let stdout = Self::lines(stdout, command_line.clone());
        let stderr = Self::lines(stderr, command_line.clone());
        let status = Box::pin(async move {
            child
                .wait()
                .await
                .map(ExitStatus::from)
                .map_err(|source| ProcessError::Output {
                    command: command_line,
                    source,
                })
        });

        Ok(ProcessStream {
            stdout,
            stderr,
            status,
        })
    }
}

/// Runner that logs every command and reports success without spawning anything
pub struct DryRunProcessRunner;

#[async_trait]
impl ProcessRunner for DryRunProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        tracing::info!("[dry-run] {}", command.command_line());
        Ok(ProcessOutput {
            status: ExitStatus::Success,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        })
    }

    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        tracing::info!("[dry-run] {}", command.command_line());
        Ok(ProcessStream {
            stdout: Box::pin(futures::stream::empty()),
            stderr: Box::pin(futures::stream::empty()),
            status: Box::pin(futures::future::ready(Ok(ExitStatus::Success))),
        })
    }
}
