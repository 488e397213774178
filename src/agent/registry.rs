//! Agent registry
//!
//! Maps agent names to loaders. Populated once at startup; a lookup never
//! touches code that was not registered.

use std::collections::BTreeMap;

use super::{Agent, LoadError};

/// Produces an [`Agent`] on demand. Loading may fail (for example, a script
/// manifest that no longer parses).
pub type AgentLoader = Box<dyn Fn() -> Result<Agent, LoadError> + Send + Sync>;

/// Name → loader table
#[derive(Default)]
pub struct AgentRegistry {
    loaders: BTreeMap<String, AgentLoader>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, loader: F)
    where
        F: Fn() -> Result<Agent, LoadError> + Send + Sync + 'static,
    {
        self.loaders.insert(name.into(), Box::new(loader));
    }

    /// Register an infallible agent constructor.
    pub fn register_agent<F>(&mut self, name: impl Into<String>, build: F)
    where
        F: Fn() -> Agent + Send + Sync + 'static,
    {
        self.register(name, move || Ok(build()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Load the agent registered under `name`. `None` when unregistered.
    pub fn load(&self, name: &str) -> Option<Result<Agent, LoadError>> {
        self.loaders.get(name).map(|loader| loader())
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}
