//! Application configuration
//!
//! Settings that apply to the whole process rather than to a single gear run.

/// Application configuration structure
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Verbosity level from repeated `-v` flags
    pub verbose: u8,
    /// `gear-log-level` from the gear configuration, used when no `-v` is given
    pub gear_log_level: Option<String>,
}

impl AppConfig {
    /// Create a new application configuration
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            gear_log_level: None,
        }
    }

    pub fn with_gear_log_level(mut self, level: Option<String>) -> Self {
        self.gear_log_level = level;
        self
    }

    /// Get the log filter based on verbosity, falling back to the gear level
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => self
                .gear_log_level
                .as_deref()
                .map(gear_level_filter)
                .unwrap_or("info"),
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Map Python-style level names (`DEBUG`, `INFO`, `WARNING`, ...) to a filter
fn gear_level_filter(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}
