//! Command-line assembly for external tools
//!
//! Provides pure functions that turn an [`OptionMap`] into argument tokens:
//! - single-character keys render as short options: `-k value`
//! - longer keys render as long options: `--key=value`
//! - boolean flags render bare when true and are dropped when false
//!
//! # Examples
//!
//! ```
//! use topup_gear::command::{build_command_list, OptionMap};
//!
//! let options = OptionMap::new()
//!     .with("imain", "a.nii")
//!     .with("verbose", true);
//!
//! let command = build_command_list(vec!["topup".to_string()], &options, true).unwrap();
//! assert_eq!(command, vec!["topup", "--imain=a.nii", "--verbose"]);
//! ```

use super::options::{OptionMap, OptionValue};
use crate::error::{GearError, Result};

/// Pure: Append the tokens for every option to `command`, in map order.
///
/// With `include_keys = false` no option names are emitted: short options
/// contribute nothing, long booleans contribute nothing, and other long
/// options contribute their value alone.
pub fn build_command_list(
    mut command: Vec<String>,
    options: &OptionMap,
    include_keys: bool,
) -> Result<Vec<String>> {
    for (key, value) in options.iter() {
        command.extend(option_tokens(key, value, include_keys)?);
    }
    Ok(command)
}

/// Pure: Tokens contributed by a single option
pub fn option_tokens(key: &str, value: &OptionValue, include_keys: bool) -> Result<Vec<String>> {
    match key.chars().count() {
        0 => Err(GearError::invalid_option(
            key,
            "option names must not be empty",
        )),
        1 => Ok(short_option_tokens(key, value, include_keys)),
        _ => Ok(long_option_tokens(key, value, include_keys)),
    }
}

/// Characters a POSIX shell would interpret in an unquoted word. `=` and `,`
/// are plain, so `--key=value` and `--warpres=20,16,14` print as-is.
const SHELL_SPECIAL: &[char] = &[
    '\'', '"', '\\', '$', '`', '|', '&', ';', '<', '>', '(', ')', '*', '?', '[', ']', '{', '}',
    '~', '#', '!',
];

/// Render tokens as one copy-pasteable command line, quoting only the tokens
/// that contain whitespace or shell metacharacters (and empty tokens).
pub fn join_command<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| {
            let token = token.as_ref();
            let plain = !token.is_empty()
                && !token
                    .chars()
                    .any(|c| c.is_whitespace() || SHELL_SPECIAL.contains(&c));
            if plain {
                token.to_string()
            } else {
                shell_words::quote(token).into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn short_option_tokens(key: &str, value: &OptionValue, include_keys: bool) -> Vec<String> {
    if !include_keys {
        return Vec::new();
    }

    match value {
        OptionValue::Flag(true) | OptionValue::Bare => vec![format!("-{key}")],
        OptionValue::Flag(false) => Vec::new(),
        OptionValue::Value(v) => vec![format!("-{key}"), v.clone()],
    }
}

fn long_option_tokens(key: &str, value: &OptionValue, include_keys: bool) -> Vec<String> {
    match value {
        OptionValue::Flag(true) if include_keys => vec![format!("--{key}")],
        OptionValue::Flag(_) => Vec::new(),
        OptionValue::Bare if include_keys => vec![format!("--{key}")],
        OptionValue::Bare => vec![String::new()],
        OptionValue::Value(v) if include_keys => vec![format!("--{key}={v}")],
        OptionValue::Value(v) => vec![v.clone()],
    }
}
