/// Error code registry for the topup gear
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Input errors
/// - 4000-4999: Execution errors
/// - 5000-5999: Pipeline errors
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_JSON: u16 = 1003;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_ENVIRONMENT: u16 = 1010;

    // Input errors (2000-2999)
    pub const INPUT_MISSING: u16 = 2001;
    pub const INPUT_NOT_FOUND: u16 = 2002;
    pub const INPUT_UNREADABLE: u16 = 2003;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;
    pub const EXEC_SIGNAL_RECEIVED: u16 = 4005;
    pub const EXEC_SPAWN_FAILED: u16 = 4007;
    pub const EXEC_OUTPUT_ERROR: u16 = 4008;
    pub const EXEC_ENVIRONMENT_ERROR: u16 = 4010;

    // Pipeline errors (5000-5999)
    pub const PIPELINE_GENERIC: u16 = 5000;
    pub const PIPELINE_STEP_FAILED: u16 = 5003;
    pub const PIPELINE_OUTPUT_MISSING: u16 = 5004;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_INVALID_OPTION: u16 = 7002;
    pub const VALIDATION_INVALID_PARAMETER: u16 = 7003;
    pub const VALIDATION_MISMATCHED_LENGTHS: u16 = 7004;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
    pub const OTHER_IO: u16 = 9001;
    pub const OTHER_IMAGE: u16 = 9002;
}

/// Get a human-readable description of an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "General configuration error",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_INVALID_JSON => "Configuration file is not valid JSON",
        ErrorCode::CONFIG_INVALID_VALUE => "Configuration value has the wrong type",
        ErrorCode::CONFIG_ENVIRONMENT => "Gear environment file could not be loaded",

        ErrorCode::INPUT_MISSING => "Required gear input was not provided",
        ErrorCode::INPUT_NOT_FOUND => "Gear input file does not exist",
        ErrorCode::INPUT_UNREADABLE => "Gear input file could not be read",

        ErrorCode::EXEC_GENERIC => "General execution error",
        ErrorCode::EXEC_COMMAND_NOT_FOUND => "Command not found on PATH",
        ErrorCode::EXEC_SUBPROCESS_FAILED => "Command exited with a non-zero status",
        ErrorCode::EXEC_SIGNAL_RECEIVED => "Command terminated by a signal",
        ErrorCode::EXEC_SPAWN_FAILED => "Command could not be started",
        ErrorCode::EXEC_OUTPUT_ERROR => "Command output could not be read",
        ErrorCode::EXEC_ENVIRONMENT_ERROR => "Command environment is incomplete",

        ErrorCode::PIPELINE_GENERIC => "General pipeline error",
        ErrorCode::PIPELINE_STEP_FAILED => "Pipeline step failed",
        ErrorCode::PIPELINE_OUTPUT_MISSING => "Expected pipeline output is missing",

        ErrorCode::VALIDATION_GENERIC => "General validation error",
        ErrorCode::VALIDATION_INVALID_OPTION => "Invalid command option",
        ErrorCode::VALIDATION_INVALID_PARAMETER => "Invalid numeric parameter",
        ErrorCode::VALIDATION_MISMATCHED_LENGTHS => "Paired lists have different lengths",

        ErrorCode::OTHER_GENERIC => "Unexpected error",
        ErrorCode::OTHER_IO => "File system error",
        ErrorCode::OTHER_IMAGE => "Image encoding or decoding error",

        _ => "Unknown error code",
    }
}
