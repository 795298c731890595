use std::path::{Path, PathBuf};
use tracing::info;

use super::context::GearContext;
use crate::error::{ErrorCode, GearError, Result};
use crate::volume::VolumeProbe;

pub const IMAGE_1: &str = "image_1";
pub const IMAGE_2: &str = "image_2";
pub const ACQUISITION_PARAMETERS: &str = "acquisition_parameters";
pub const CONFIG_FILE: &str = "config_file";
pub const APPLY_TO_1: &str = "apply_to_1";
pub const APPLY_TO_2: &str = "apply_to_2";

/// Gear input files, resolved and checked for existence
#[derive(Debug, Clone, PartialEq)]
pub struct GearInputs {
    pub image_1: PathBuf,
    pub image_2: PathBuf,
    pub acquisition_parameters: PathBuf,
    pub config_file: Option<PathBuf>,
    pub apply_to_1: Option<PathBuf>,
    pub apply_to_2: Option<PathBuf>,
}

/// An image to correct, with its 1-based row in the acquisition parameters file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTarget {
    pub path: PathBuf,
    pub index: usize,
}

impl ApplyTarget {
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }

    /// File name of the target, used to derive output names
    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl GearInputs {
    pub fn resolve(context: &GearContext) -> Result<Self> {
        Ok(Self {
            image_1: required(context, IMAGE_1)?,
            image_2: required(context, IMAGE_2)?,
            acquisition_parameters: required(context, ACQUISITION_PARAMETERS)?,
            config_file: optional(context, CONFIG_FILE)?,
            apply_to_1: optional(context, APPLY_TO_1)?,
            apply_to_2: optional(context, APPLY_TO_2)?,
        })
    }

    /// Images topup correction is applied to, in a fixed order:
    /// 4D image_1, 4D image_2, apply_to_1, apply_to_2.
    pub fn apply_targets(&self, probe: &dyn VolumeProbe) -> Result<Vec<ApplyTarget>> {
        let mut targets = Vec::new();

        if probe.is_4d(&self.image_1)? {
            targets.push(ApplyTarget::new(&self.image_1, 1));
        }
        if probe.is_4d(&self.image_2)? {
            targets.push(ApplyTarget::new(&self.image_2, 2));
        }
        if let Some(path) = &self.apply_to_1 {
            targets.push(ApplyTarget::new(path, 1));
        }
        if let Some(path) = &self.apply_to_2 {
            targets.push(ApplyTarget::new(path, 2));
        }

        for target in &targets {
            info!("Will run applytopup on {}", target.path.display());
        }
        Ok(targets)
    }
}

fn required(context: &GearContext, name: &str) -> Result<PathBuf> {
    optional(context, name)?.ok_or_else(|| {
        GearError::input(
            ErrorCode::INPUT_MISSING,
            "required input was not provided",
            name,
        )
    })
}

fn optional(context: &GearContext, name: &str) -> Result<Option<PathBuf>> {
    match context.get_input_path(name) {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(GearError::input(
            ErrorCode::INPUT_NOT_FOUND,
            format!("{} does not exist", path.display()),
            name,
        )),
        None => Ok(None),
    }
}
