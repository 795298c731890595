use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ErrorCode, GearError, Result};

pub const DEFAULT_GEAR_DIR: &str = "/flywheel/v0";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_TOPUP_CONFIG: &str = "b02b0.cnf";

/// Values from the `config` block of `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearConfig {
    #[serde(rename = "gear-log-level", default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub displacement_field: bool,
    #[serde(default)]
    pub jacobian_determinants: bool,
    #[serde(default)]
    pub rigid_body_matrix: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub topup_debug_level: u8,
    #[serde(default)]
    pub topup_only: bool,
    #[serde(rename = "QA", default)]
    pub qa: bool,
    #[serde(default)]
    pub motion_premat: bool,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            displacement_field: false,
            jacobian_determinants: false,
            rigid_body_matrix: false,
            verbose: false,
            topup_debug_level: 0,
            topup_only: false,
            qa: false,
            motion_premat: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: GearConfig,
    #[serde(default)]
    inputs: BTreeMap<String, InputEntry>,
}

#[derive(Debug, Deserialize)]
struct InputEntry {
    location: InputLocation,
}

#[derive(Debug, Deserialize)]
struct InputLocation {
    path: PathBuf,
}

/// The gear's view of its run: configuration, input files and directories.
#[derive(Debug, Clone)]
pub struct GearContext {
    root: PathBuf,
    config: GearConfig,
    inputs: BTreeMap<String, PathBuf>,
    output_dir: PathBuf,
    work_dir: PathBuf,
}

impl GearContext {
    /// Load `<root>/config.json`
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            GearError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                "cannot read gear configuration",
                Some(path.clone()),
            )
            .with_source(e)
        })?;
        Self::from_json(root, &text).map_err(|e| match e {
            GearError::Config {
                code,
                message,
                source,
                ..
            } => GearError::Config {
                code,
                message,
                path: Some(path.clone()),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(root: &Path, text: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(text).map_err(|e| {
            GearError::config_with_code(
                ErrorCode::CONFIG_INVALID_JSON,
                format!("invalid gear configuration: {}", e),
                None,
            )
            .with_source(e)
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            config: file.config,
            inputs: file
                .inputs
                .into_iter()
                .map(|(name, entry)| (name, entry.location.path))
                .collect(),
            output_dir: root.join("output"),
            work_dir: root.join("work"),
        })
    }

    pub fn config(&self) -> &GearConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Path of a named input, if it was provided
    pub fn get_input_path(&self, name: &str) -> Option<&Path> {
        self.inputs.get(name).map(PathBuf::as_path)
    }

    /// Topup configuration shipped with the gear
    pub fn default_topup_config(&self) -> PathBuf {
        self.root.join(DEFAULT_TOPUP_CONFIG)
    }

    pub fn log_config(&self) {
        info!("Gear configuration:");
        match serde_json::to_string_pretty(&self.config) {
            Ok(text) => {
                for line in text.lines() {
                    info!("  {}", line);
                }
            }
            Err(e) => info!("  <unserializable configuration: {}>", e),
        }
        for (name, path) in &self.inputs {
            info!("Input {}: {}", name, path.display());
        }
    }
}
