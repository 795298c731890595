//! Command assembly for external tools.
//!
//! - `options` - Tagged option values and insertion-ordered option maps
//! - `assembler` - Pure conversion of option maps into argument tokens

pub mod assembler;
pub mod options;

pub use assembler::{build_command_list, join_command, option_tokens};
pub use options::{OptionMap, OptionValue};
