//! Configuration value model.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A configuration mapping. Keys are kept sorted so rendered output and
/// flattened override tokens are deterministic.
pub type Configuration = BTreeMap<String, ConfigValue>;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Only produced by persisted files; merging replaces lists wholesale.
    List(Vec<ConfigValue>),
    Map(Configuration),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Configuration> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    /// Convert a parsed JSON document into a configuration value.
    ///
    /// JSON `null` has no counterpart and yields `None`; nulls nested in
    /// objects or arrays are dropped.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(ConfigValue::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ConfigValue::Int(i)),
                None => n.as_f64().map(ConfigValue::Float),
            },
            serde_json::Value::String(s) => Some(ConfigValue::String(s)),
            serde_json::Value::Array(items) => Some(ConfigValue::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(ConfigValue::Map(
                map.into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

/// Renders the value the way it is written on a command line.
///
/// Floats always carry a `.` so they re-parse as floats; lists and maps
/// render as compact JSON.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => {
                let rendered = x.to_string();
                if x.is_finite() && !rendered.contains('.') {
                    write!(f, "{}.0", rendered)
                } else {
                    f.write_str(&rendered)
                }
            }
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::List(_) | ConfigValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        ConfigValue::Float(x)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<Configuration> for ConfigValue {
    fn from(m: Configuration) -> Self {
        ConfigValue::Map(m)
    }
}

/// Look up a value by dot-separated path.
pub fn get_path<'a>(config: &'a Configuration, path: &str) -> Option<&'a ConfigValue> {
    let mut segments = path.split('.');
    let mut current = config.get(segments.next()?)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}
