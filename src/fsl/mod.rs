//! FSL command lines and their execution.
//!
//! - `commands` - Pure builders for each tool invocation
//! - `runner` - [`FslRunner`] executing them with the gear environment

pub mod commands;
pub mod runner;

pub use commands::TopupOptions;
pub use runner::{FslRunner, FslRunnerImpl};
