//! Visual QA report for topup corrections.
//!
//! - `outline` - BET outline extraction and overlay rendering through FSL
//! - `report` - Composition of rendered overlays into a single PNG report

pub mod outline;
pub mod report;

pub use outline::outline_overlay;
pub use report::{compose_report, generate_topup_report};
