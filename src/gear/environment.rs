//! Docker image environment captured at build time.
//!
//! The gear image stores its environment (FSLDIR, PATH, FSLOUTPUTTYPE, ...) as a
//! flat JSON object. It is loaded into a value that is handed to every external
//! command; the process environment of the gear itself is never modified.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ErrorCode, GearError, Result};

pub const DEFAULT_ENVIRON_PATH: &str = "/tmp/gear_environ.json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GearEnvironment {
    vars: BTreeMap<String, String>,
}

impl GearEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the environment file; an absent file yields an empty environment.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Gear environment file {} not found, tools get PATH and system variables only",
                path.display()
            );
            return Ok(Self::new());
        }

        info!("Loading gear environment from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            GearError::config_with_code(
                ErrorCode::CONFIG_ENVIRONMENT,
                "cannot read gear environment",
                Some(path.to_path_buf()),
            )
            .with_source(e)
        })?;

        Self::from_json(&text).map_err(|e| e.with_context(path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text).map_err(|e| {
            GearError::config_with_code(
                ErrorCode::CONFIG_ENVIRONMENT,
                format!("gear environment is not a JSON object: {}", e),
                None,
            )
        })?;

        let mut vars = BTreeMap::new();
        for (key, value) in raw {
            match value {
                serde_json::Value::String(s) => {
                    vars.insert(key, s);
                }
                other => {
                    return Err(GearError::config_with_code(
                        ErrorCode::CONFIG_INVALID_VALUE,
                        format!("environment variable {} must be a string, got {}", key, other),
                        None,
                    ))
                }
            }
        }

        debug!("Loaded {} gear environment variables", vars.len());
        Ok(Self { vars })
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
