//! Agents and their dispatch
//!
//! An [`Agent`] is a named unit of work: declared default configuration plus
//! an optional entry point taking positional arguments and the resolved
//! configuration. Agents are registered by name in an [`AgentRegistry`] and
//! run through a [`Dispatcher`], which contains every agent-local failure.

mod dispatcher;
mod registry;

pub use dispatcher::{resolve_agent_config, DispatchOutcome, Dispatcher};
pub use registry::{AgentLoader, AgentRegistry};

use std::fmt;

use yggdrasil_config::Configuration;

use crate::agents::ManifestError;

/// Agent entry point: `(positional_args, resolved_config)`.
pub type EntryPoint = Box<dyn Fn(&[String], &Configuration) -> anyhow::Result<()> + Send + Sync>;

/// A loaded agent
pub struct Agent {
    name: String,
    description: String,
    defaults: Configuration,
    entry: Option<EntryPoint>,
}

impl Agent {
    /// Create an agent with no defaults and no entry point.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            defaults: Configuration::new(),
            entry: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_defaults(mut self, defaults: Configuration) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_entry<F>(mut self, entry: F) -> Self
    where
        F: Fn(&[String], &Configuration) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.entry = Some(Box::new(entry));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared default configuration (lowest-precedence layer).
    pub fn defaults(&self) -> &Configuration {
        &self.defaults
    }

    pub fn entry_point(&self) -> Option<&EntryPoint> {
        self.entry.as_ref()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("defaults", &self.defaults)
            .field("has_entry_point", &self.entry.is_some())
            .finish()
    }
}

/// Errors loading a registered agent
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("{0}")]
    Other(String),
}
