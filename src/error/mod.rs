use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The unified error type for the gear library
#[derive(Error, Debug)]
pub enum GearError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Input error: {message}")]
    Input {
        code: u16,
        message: String,
        input: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Execution error: {message}")]
    Execution {
        code: u16,
        message: String,
        command: Option<String>,
        exit_code: Option<i32>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Pipeline error: {message}")]
    Pipeline {
        code: u16,
        message: String,
        step: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GearError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message, None)
    }

    /// Create a configuration error with specific code and file path
    pub fn config_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create an input error for a named gear input
    pub fn input(code: u16, message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Input {
            code,
            message: message.into(),
            input: Some(input.into()),
            source: None,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::execution_with_code(ErrorCode::EXEC_GENERIC, message, None)
    }

    /// Create an execution error with specific code and command
    pub fn execution_with_code(
        code: u16,
        message: impl Into<String>,
        command: Option<String>,
    ) -> Self {
        Self::Execution {
            code,
            message: message.into(),
            command,
            exit_code: None,
            source: None,
        }
    }

    /// Create a pipeline error with default code
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            code: ErrorCode::PIPELINE_GENERIC,
            message: message.into(),
            step: None,
            source: None,
        }
    }

    /// Create a pipeline error with specific code
    pub fn pipeline_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Pipeline {
            code,
            message: message.into(),
            step: None,
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with_code(ErrorCode::VALIDATION_GENERIC, message, None)
    }

    /// Validation failure tied to a named field (an option key, a motion parameter)
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// An option value that cannot be rendered on a command line
    pub fn invalid_option(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation_with_code(
            ErrorCode::VALIDATION_INVALID_OPTION,
            message,
            Some(key.into()),
        )
    }

    /// A numeric parameter outside the accepted domain
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation_with_code(
            ErrorCode::VALIDATION_INVALID_PARAMETER,
            message,
            Some(name.into()),
        )
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Create a generic error with specific code
    pub fn other_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Other {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Input { source: src, .. }
            | Self::Execution { source: src, .. }
            | Self::Pipeline { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Append `: context` to the message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Input { message, .. }
            | Self::Execution { message, .. }
            | Self::Pipeline { message, .. }
            | Self::Validation { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Process exit code, one per error category
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Input { .. } => 3,
            Self::Execution { .. } => 5,
            Self::Pipeline { .. } => 6,
            Self::Validation { .. } => 8,
            Self::Other { .. } => 1,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Input { code, .. }
            | Self::Execution { code, .. }
            | Self::Pipeline { code, .. }
            | Self::Validation { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, path, .. } => match path {
                Some(p) => format!("Configuration problem in {}: {}", p.display(), message),
                None => format!("Configuration problem: {}", message),
            },
            Self::Input { message, input, .. } => match input {
                Some(name) => format!("Input '{}': {}", name, message),
                None => format!("Input error: {}", message),
            },
            Self::Execution {
                message, command, ..
            } => match command {
                Some(cmd) => format!("Command '{}' failed: {}", cmd, message),
                None => format!("Execution error: {}", message),
            },
            Self::Pipeline { message, step, .. } => match step {
                Some(s) => format!("Pipeline failed at step '{}': {}", s, message),
                None => format!("Pipeline error: {}", message),
            },
            Self::Validation { message, field, .. } => match field {
                Some(f) => format!("Validation error for '{}': {}", f, message),
                None => format!("Validation error: {}", message),
            },
            Self::Other { message, .. } => message.clone(),
        }
    }

    /// Code, category, message and the full `source` chain, for `-v` output
    pub fn developer_message(&self) -> String {
        use std::error::Error as _;

        let mut msg = format!("{} ({})", self, describe_error_code(self.code()));
        let mut source = self.source();
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        msg
    }

    /// Record the tool's exit status on an execution error
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        if let Self::Execution {
            exit_code: ref mut ec,
            ..
        } = self
        {
            *ec = Some(exit_code);
        }
        self
    }

    /// Set the step for a pipeline error
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        if let Self::Pipeline {
            step: ref mut s, ..
        } = self
        {
            *s = Some(step.into());
        }
        self
    }
}

impl From<std::io::Error> for GearError {
    fn from(err: std::io::Error) -> Self {
        GearError::other_with_code(ErrorCode::OTHER_IO, err.to_string()).with_source(err)
    }
}

impl From<image::ImageError> for GearError {
    fn from(err: image::ImageError) -> Self {
        GearError::other_with_code(ErrorCode::OTHER_IMAGE, err.to_string()).with_source(err)
    }
}

/// Type alias for Results using GearError
pub type Result<T> = std::result::Result<T, GearError>;
