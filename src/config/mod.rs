//! Configuration layers
//!
//! Framework configuration is merged from:
//! 1. Built-in framework defaults
//! 2. `config/framework_config.json`
//! 3. `--set KEY=VALUE` flags
//!
//! Agent configuration is merged from:
//! 1. The agent's declared defaults
//! 2. `agents/config/<agent>.json`
//! 3. `--agent-set KEY=VALUE` flags

mod framework;
mod store;

pub use framework::{framework_defaults, resolve_framework_config, FrameworkSettings};
pub use store::{toml_to_config, ConfigStore, StoreError};
pub use yggdrasil_config::{
    flatten, get_path, merge, parse_overrides, ConfigValue, Configuration, OverrideWarning,
};
