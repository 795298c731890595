use crate::error::{ErrorCode, GearError};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command `{command}` failed with exit code {exit_code:?}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Command `{command}` was terminated by signal {signal}")]
    KilledBySignal { command: String, signal: i32 },

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read output of `{command}`: {source}")]
    Output {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PATH is not set in the parent process or the gear environment (required for '{program}')")]
    MissingPath { program: String },

    #[error("Empty command line")]
    EmptyCommand,

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

impl From<ProcessError> for GearError {
    fn from(err: ProcessError) -> Self {
        let (code, command, exit_code) = match &err {
            ProcessError::CommandNotFound(program) => {
                (ErrorCode::EXEC_COMMAND_NOT_FOUND, Some(program.clone()), None)
            }
            ProcessError::CommandFailed {
                command, exit_code, ..
            } => (
                ErrorCode::EXEC_SUBPROCESS_FAILED,
                Some(command.clone()),
                *exit_code,
            ),
            ProcessError::KilledBySignal { command, .. } => {
                (ErrorCode::EXEC_SIGNAL_RECEIVED, Some(command.clone()), None)
            }
            ProcessError::SpawnFailed { command, .. } => {
                (ErrorCode::EXEC_SPAWN_FAILED, Some(command.clone()), None)
            }
            ProcessError::Output { command, .. } => {
                (ErrorCode::EXEC_OUTPUT_ERROR, Some(command.clone()), None)
            }
            ProcessError::MissingPath { .. } => (ErrorCode::EXEC_ENVIRONMENT_ERROR, None, None),
            ProcessError::EmptyCommand | ProcessError::MockExpectationNotMet(_) => {
                (ErrorCode::EXEC_GENERIC, None, None)
            }
        };

        let mut error = GearError::execution_with_code(code, err.to_string(), command);
        if let Some(exit_code) = exit_code {
            error = error.with_exit_code(exit_code);
        }
        error.with_source(err)
    }
}
