//! Yggdrasil - agent dispatcher
//!
//! Resolves named agents from a startup-time registry, computes each agent's
//! configuration from layered sources, and runs it. Pipeline agents compose
//! other agents by re-invoking the dispatcher binary as a child process.

pub mod agent;
pub mod agents;
pub mod cli;
pub mod config;
pub mod layout;
pub mod logging;
pub mod orchestrator;

pub use agent::{Agent, AgentRegistry, DispatchOutcome, Dispatcher, LoadError};
pub use config::{ConfigStore, ConfigValue, Configuration, FrameworkSettings};
pub use layout::ProjectLayout;
pub use orchestrator::{Orchestrator, StageError};
