//! # topup-gear
//!
//! Runs FSL TOPUP susceptibility distortion correction as a gear: reads the
//! gear configuration, prepares the topup input, runs `topup` and `applytopup`,
//! and optionally resamples with topup's motion estimates and renders a QA report.
//!
//! ## Usage
//!
//! ```bash
//! topup-gear run [--gear-dir DIR] [--environ FILE] [--dry-run]
//! topup-gear premat TX TY TZ RX RY RZ
//! topup-gear assemble topup imain=a.nii verbose
//! ```
//!
//! ## Modules
//!
//! - `app` - Logging setup, application configuration and fatal error handling
//! - `command` - Option maps and command-line assembly
//! - `error` - Error types and error codes
//! - `fsl` - FSL command builders and the runner executing them
//! - `gear` - Gear configuration, inputs and docker environment
//! - `pipeline` - The sequential topup pipeline driver
//! - `qa` - Outline overlays and the QA report
//! - `subprocess` - Subprocess abstraction layer for testing
//! - `transform` - Rigid transforms and premat files from motion parameters
//! - `volume` - NIfTI header inspection
pub mod app;
pub mod command;
pub mod error;
pub mod fsl;
pub mod gear;
pub mod pipeline;
pub mod qa;
pub mod subprocess;
pub mod transform;
pub mod volume;
