use async_trait::async_trait;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::gear::GearEnvironment;
use crate::subprocess::{
    ExitStatus, ProcessCommand, ProcessCommandBuilder, ProcessError, ProcessRunner, ProcessStream,
};

/// Executes FSL command lines produced by [`super::commands`].
#[async_trait]
pub trait FslRunner: Send + Sync {
    /// Run a tool to completion and return its stdout.
    async fn run(&self, command: Vec<String>) -> Result<String, ProcessError>;

    /// Run a tool, logging its stdout line by line while it runs.
    async fn run_logged(&self, command: Vec<String>) -> Result<(), ProcessError>;
}

pub struct FslRunnerImpl {
    runner: Arc<dyn ProcessRunner>,
    environment: GearEnvironment,
    bin_dir: Option<PathBuf>,
}

impl FslRunnerImpl {
    pub fn new(runner: Arc<dyn ProcessRunner>, environment: GearEnvironment) -> Self {
        Self {
            runner,
            environment,
            bin_dir: None,
        }
    }

    /// Resolve bare program names against `dir` instead of `PATH`
    pub fn with_bin_dir(mut self, dir: PathBuf) -> Self {
        self.bin_dir = Some(dir);
        self
    }

    fn resolve_program(&self, program: &str) -> String {
        match &self.bin_dir {
            Some(dir) if !program.contains('/') => dir.join(program).to_string_lossy().into_owned(),
            _ => program.to_string(),
        }
    }

    fn to_process_command(&self, command: Vec<String>) -> Result<ProcessCommand, ProcessError> {
        let mut tokens = command.into_iter();
        let program = tokens.next().ok_or(ProcessError::EmptyCommand)?;

        let builder = ProcessCommandBuilder::new(&self.resolve_program(&program)).args(tokens);

        Ok(builder.envs(self.environment.vars().iter()).build())
    }
}

/// Non-zero exit becomes `CommandFailed` carrying the tool's stderr
fn check_status(
    command_line: &str,
    status: &ExitStatus,
    stderr: &str,
) -> Result<(), ProcessError> {
    let stderr = stderr.trim_end();
    match status {
        ExitStatus::Success => Ok(()),
        ExitStatus::Signal(signal) => {
            error!("The command:\n {}\nwas killed by signal {}", command_line, signal);
            Err(ProcessError::KilledBySignal {
                command: command_line.to_string(),
                signal: *signal,
            })
        }
        ExitStatus::Error(code) => {
            error!("The command:\n {}\nfailed with:\n{}", command_line, stderr);
            Err(ProcessError::CommandFailed {
                command: command_line.to_string(),
                exit_code: Some(*code),
                stderr: stderr.to_string(),
            })
        }
    }
}

#[async_trait]
impl FslRunner for FslRunnerImpl {
    async fn run(&self, command: Vec<String>) -> Result<String, ProcessError> {
        let command = self.to_process_command(command)?;
        let command_line = command.command_line();

        let output = self.runner.run(command).await?;
        if !output.stdout.trim().is_empty() {
            debug!("{}", output.stdout.trim_end());
        }
        check_status(&command_line, &output.status, &output.stderr)?;
        Ok(output.stdout)
    }

    async fn run_logged(&self, command: Vec<String>) -> Result<(), ProcessError> {
        let command = self.to_process_command(command)?;
        let command_line = command.command_line();

        let ProcessStream {
            mut stdout,
            mut stderr,
            status,
        } = self.runner.run_streaming(command).await?;

        let log_stdout = async {
            while let Some(line) = stdout.next().await {
                let line = line?;
                if !line.is_empty() {
                    info!("{}", line);
                }
            }
            Ok::<_, ProcessError>(())
        };
        let collect_stderr = async {
            let mut collected = String::new();
            while let Some(line) = stderr.next().await {
                collected.push_str(&line?);
                collected.push('\n');
            }
            Ok::<_, ProcessError>(collected)
        };

        let (logged, collected) = futures::join!(log_stdout, collect_stderr);
        logged?;
        let stderr = collected?;

        let status = status.await?;
        check_status(&command_line, &status, &stderr)
    }
}
