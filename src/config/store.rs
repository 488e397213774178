//! Persisted configuration files
//!
//! Missing and malformed files never fail a dispatch: they degrade to an
//! empty layer and a log line. The severity depends on which file it is; a
//! missing per-agent file is the common case and only logged at info.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::layout::ProjectLayout;
use yggdrasil_config::{ConfigValue, Configuration};

/// Errors reading a persisted configuration file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{} does not contain a key/value object", .0.display())]
    NotAMapping(PathBuf),
}

/// Loads framework and per-agent configuration from the project layout.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    layout: ProjectLayout,
}

impl ConfigStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Load `config/framework_config.json`.
    ///
    /// Any failure, including a missing file, is logged at error level and
    /// yields an empty configuration.
    pub fn load_framework_config(&self) -> Configuration {
        let path = self.layout.framework_config_path();
        match read_config(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("framework config unavailable: {}", e);
                Configuration::new()
            }
        }
    }

    /// Load `agents/config/<agent>.json`.
    ///
    /// A missing file is logged at info level; a malformed one at error
    /// level. Both yield an empty configuration.
    pub fn load_agent_config(&self, agent: &str) -> Configuration {
        let path = self.layout.agent_config_path(agent);
        match read_config(&path) {
            Ok(config) => config,
            Err(StoreError::NotFound(path)) => {
                tracing::info!(
                    "no config file for agent '{}' at {} (skipping)",
                    agent,
                    path.display()
                );
                Configuration::new()
            }
            Err(e) => {
                tracing::error!("config for agent '{}' unavailable: {}", agent, e);
                Configuration::new()
            }
        }
    }
}

/// Read a configuration file.
///
/// `path` names the JSON file. When it does not exist, a `.toml` file with
/// the same stem is tried before reporting [`StoreError::NotFound`].
pub fn read_config(path: &Path) -> Result<Configuration, StoreError> {
    let toml_path = path.with_extension("toml");
    let (file, is_toml) = if path.exists() {
        (path, false)
    } else if toml_path.exists() {
        (toml_path.as_path(), true)
    } else {
        return Err(StoreError::NotFound(path.to_path_buf()));
    };

    let bytes = fs::read(file).map_err(|e| StoreError::Io {
        path: file.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let config = if is_toml {
        parse_toml(file, &bytes)?
    } else {
        parse_json(file, &bytes)?
    };

    tracing::debug!(path = %file.display(), sha256 = %digest, "loaded config file");
    Ok(config)
}

fn parse_json(path: &Path, bytes: &[u8]) -> Result<Configuration, StoreError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match ConfigValue::from_json(value) {
        Some(ConfigValue::Map(config)) => Ok(config),
        _ => Err(StoreError::NotAMapping(path.to_path_buf())),
    }
}

fn parse_toml(path: &Path, bytes: &[u8]) -> Result<Configuration, StoreError> {
    let contents = std::str::from_utf8(bytes).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: format!("invalid UTF-8: {}", e),
    })?;

    let table: toml::Table = toml::from_str(contents).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(toml_to_config(table))
}

/// Convert a TOML table into a configuration.
pub fn toml_to_config(table: toml::Table) -> Configuration {
    table
        .into_iter()
        .map(|(k, v)| (k, toml_to_value(v)))
        .collect()
}

fn toml_to_value(value: toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(s) => ConfigValue::String(s),
        toml::Value::Integer(i) => ConfigValue::Int(i),
        toml::Value::Float(f) => ConfigValue::Float(f),
        toml::Value::Boolean(b) => ConfigValue::Bool(b),
        toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
        toml::Value::Array(items) => {
            ConfigValue::List(items.into_iter().map(toml_to_value).collect())
        }
        toml::Value::Table(table) => ConfigValue::Map(toml_to_config(table)),
    }
}
