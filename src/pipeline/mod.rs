//! The gear pipeline.
//!
//! A single sequential driver; every external call is awaited before the next
//! one starts and the first failure aborts the run.

pub mod driver;


pub use driver::{PipelineOutcome, TopupPipeline};
