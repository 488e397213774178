//! Framework-level configuration
//!
//! Built-in defaults form the lowest layer; `framework_config.json` and
//! `--set` flags are merged on top. [`FrameworkSettings`] is the typed view
//! the binary reads back out of the merged result.

use serde::{Deserialize, Serialize};

use super::store::ConfigStore;
use yggdrasil_config::{get_path, merge, parse_overrides, ConfigValue, Configuration};

/// Typed framework settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkSettings {
    /// Declared log level (default: "INFO"). `YGGDRASIL_LOG_LEVEL` decides
    /// the effective level because logging starts before config is read.
    pub log_level: String,

    /// Log file name under `logs/` (default: "yggdrasil.log")
    pub log_file: String,

    /// Per-agent timeout in seconds (default: 60). Read and reported, never
    /// enforced.
    pub timeout_seconds: u64,

    /// Exit non-zero when a dispatched agent fails (default: false)
    pub strict_exit: bool,
}

impl Default for FrameworkSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_file: crate::layout::LOG_FILE.to_string(),
            timeout_seconds: 60,
            strict_exit: false,
        }
    }
}

impl FrameworkSettings {
    /// Render as a configuration layer.
    pub fn to_config(&self) -> Configuration {
        let logging: Configuration = [
            ("level".to_string(), ConfigValue::from(self.log_level.as_str())),
            ("file".to_string(), ConfigValue::from(self.log_file.as_str())),
        ]
        .into_iter()
        .collect();

        let execution: Configuration = [
            (
                "timeout_seconds".to_string(),
                ConfigValue::Int(self.timeout_seconds as i64),
            ),
            ("strict_exit".to_string(), ConfigValue::Bool(self.strict_exit)),
        ]
        .into_iter()
        .collect();

        [
            ("logging".to_string(), ConfigValue::Map(logging)),
            ("agent_execution".to_string(), ConfigValue::Map(execution)),
        ]
        .into_iter()
        .collect()
    }

    /// Read settings out of a merged configuration. Missing or mistyped
    /// values fall back to the defaults.
    pub fn from_config(config: &Configuration) -> Self {
        let defaults = Self::default();
        Self {
            log_level: get_path(config, "logging.level")
                .and_then(ConfigValue::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.log_level),
            log_file: get_path(config, "logging.file")
                .and_then(ConfigValue::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.log_file),
            timeout_seconds: get_path(config, "agent_execution.timeout_seconds")
                .and_then(ConfigValue::as_i64)
                .and_then(|t| u64::try_from(t).ok())
                .unwrap_or(defaults.timeout_seconds),
            strict_exit: get_path(config, "agent_execution.strict_exit")
                .and_then(ConfigValue::as_bool)
                .unwrap_or(defaults.strict_exit),
        }
    }
}

/// Built-in framework defaults as a configuration layer.
pub fn framework_defaults() -> Configuration {
    FrameworkSettings::default().to_config()
}

/// Merge defaults, the persisted framework file and `--set` tokens.
pub fn resolve_framework_config<S: AsRef<str>>(store: &ConfigStore, set_tokens: &[S]) -> Configuration {
    let from_file = store.load_framework_config();
    let from_cli = parse_overrides(set_tokens).config;
    merge(&framework_defaults(), &[&from_file, &from_cli])
}
