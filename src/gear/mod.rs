//! Gear runtime layout: `config.json`, input files, output/work directories and
//! the environment captured in the docker image.

pub mod context;
pub mod environment;
pub mod inputs;

pub use context::{
    GearConfig, GearContext, CONFIG_FILE_NAME, DEFAULT_GEAR_DIR, DEFAULT_TOPUP_CONFIG,
};
pub use environment::{GearEnvironment, DEFAULT_ENVIRON_PATH};
pub use inputs::{ApplyTarget, GearInputs};
