//! Option values and insertion-ordered option maps for external tool command lines.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GearError, Result};

/// How a single option participates in a command line.
///
/// The variant is fixed when the value is constructed: a value whose string
/// form is empty becomes [`OptionValue::Bare`], anything else becomes
/// [`OptionValue::Value`]. Numeric zero renders as `"0"` and is therefore a value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Boolean switch: `true` emits the bare flag, `false` drops the option.
    Flag(bool),
    /// Option present without a value (`-k` / `--key`).
    Bare,
    /// Option carrying a non-empty value (`-k value` / `--key=value`).
    Value(String),
}

impl OptionValue {
    /// Classify a rendered value by the length of its string form
    pub fn from_rendered(rendered: impl Into<String>) -> Self {
        let rendered = rendered.into();
        if rendered.is_empty() {
            OptionValue::Bare
        } else {
            OptionValue::Value(rendered)
        }
    }

    /// Convert a JSON config value; `null`, arrays and objects have no command-line form.
    pub fn from_json(key: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(OptionValue::Flag(*b)),
            serde_json::Value::Number(n) => Ok(OptionValue::from_rendered(n.to_string())),
            serde_json::Value::String(s) => Ok(OptionValue::from_rendered(s.as_str())),
            serde_json::Value::Null => Err(GearError::invalid_option(
                key,
                "null has no command-line representation",
            )),
            serde_json::Value::Array(_) => Err(GearError::invalid_option(
                key,
                "arrays have no command-line representation",
            )),
            serde_json::Value::Object(_) => Err(GearError::invalid_option(
                key,
                "objects have no command-line representation",
            )),
        }
    }

    /// Parse a `KEY`, `KEY=` or `KEY=VALUE` command-line assignment.
    ///
    /// `KEY` alone is a true flag and `KEY=` a bare option. `true`/`false` become
    /// flags and quoted JSON strings are unquoted; anything else, numbers
    /// included, is kept as literal text.
    pub fn parse_assignment(assignment: &str) -> Result<(String, OptionValue)> {
        let (key, value) = match assignment.split_once('=') {
            None => return Ok((assignment.to_string(), OptionValue::Flag(true))),
            Some((key, "")) => return Ok((key.to_string(), OptionValue::Bare)),
            Some(pair) => pair,
        };

        let value = match serde_json::from_str::<serde_json::Value>(value) {
            Ok(serde_json::Value::Number(_)) | Err(_) => OptionValue::from_rendered(value),
            Ok(json) => OptionValue::from_json(key, &json)?,
        };
        Ok((key.to_string(), value))
    }

    /// Rendered value, empty for `Bare` and booleans
    pub fn as_str(&self) -> &str {
        match self {
            OptionValue::Value(v) => v,
            _ => "",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(b) => write!(f, "{}", b),
            OptionValue::Bare => Ok(()),
            OptionValue::Value(v) => f.write_str(v),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::from_rendered(value)
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::from_rendered(value)
    }
}

impl From<&String> for OptionValue {
    fn from(value: &String) -> Self {
        OptionValue::from_rendered(value.as_str())
    }
}

impl From<&Path> for OptionValue {
    fn from(value: &Path) -> Self {
        OptionValue::from_rendered(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for OptionValue {
    fn from(value: PathBuf) -> Self {
        OptionValue::from(value.as_path())
    }
}

impl From<&PathBuf> for OptionValue {
    fn from(value: &PathBuf) -> Self {
        OptionValue::from(value.as_path())
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for OptionValue {
                fn from(value: $t) -> Self {
                    OptionValue::from_rendered(value.to_string())
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// Option name to value mapping that keeps insertion order.
///
/// Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionMap {
    entries: Vec<(String, OptionValue)>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder-style variant of [`OptionMap::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for OptionMap
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OptionMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_is_a_value_not_empty() {
        assert_eq!(OptionValue::from(0), OptionValue::Value("0".to_string()));
        assert_eq!(OptionValue::from(0.5), OptionValue::Value("0.5".to_string()));
    }

    #[test]
    fn test_empty_string_is_bare() {
        assert_eq!(OptionValue::from(""), OptionValue::Bare);
        assert_eq!(OptionValue::from(String::new()), OptionValue::Bare);
    }

    #[test]
    fn test_from_json_variants() {
        assert_eq!(
            OptionValue::from_json("verbose", &json!(true)).unwrap(),
            OptionValue::Flag(true)
        );
        assert_eq!(
            OptionValue::from_json("debug", &json!(0)).unwrap(),
            OptionValue::Value("0".to_string())
        );
        assert_eq!(
            OptionValue::from_json("out", &json!("")).unwrap(),
            OptionValue::Bare
        );
    }

    #[test]
    fn test_from_json_rejects_unsupported_types() {
        for value in [json!(null), json!([1, 2]), json!({"a": 1})] {
            let err = OptionValue::from_json("imain", &value).unwrap_err();
            assert_eq!(
                err.code(),
                crate::error::ErrorCode::VALIDATION_INVALID_OPTION
            );
        }
    }

    #[test]
    fn test_option_map_preserves_insertion_order_and_replaces() {
        let mut map = OptionMap::new();
        map.set("imain", "a.nii").set("datain", "acq.txt").set("v", true);
        map.set("imain", "b.nii");

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["imain", "datain", "v"]);
        assert_eq!(map.get("imain"), Some(&OptionValue::Value("b.nii".into())));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            OptionValue::parse_assignment("verbose").unwrap(),
            ("verbose".to_string(), OptionValue::Flag(true))
        );
        assert_eq!(
            OptionValue::parse_assignment("t=false").unwrap(),
            ("t".to_string(), OptionValue::Flag(false))
        );
        assert_eq!(
            OptionValue::parse_assignment("c=").unwrap(),
            ("c".to_string(), OptionValue::Bare)
        );
        assert_eq!(
            OptionValue::parse_assignment("f=0.50").unwrap(),
            ("f".to_string(), OptionValue::Value("0.50".into()))
        );
        assert_eq!(
            OptionValue::parse_assignment("imain=/data/a=b.nii").unwrap(),
            ("imain".to_string(), OptionValue::Value("/data/a=b.nii".into()))
        );
        assert!(OptionValue::parse_assignment("out=null").is_err());
    }

    #[test]
    fn test_option_map_remove() {
        let mut map: OptionMap = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(map.remove("a"), Some(OptionValue::Value("1".into())));
        assert_eq!(map.remove("a"), None);
        assert_eq!(map.len(), 1);
    }
}
