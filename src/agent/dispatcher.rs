//! Agent dispatcher.
//!
//! Resolves an agent by name, layers its configuration and runs its entry
//! point. Nothing an agent does escapes as an error or a panic; the result
//! is reported as a [`DispatchOutcome`] and in the log.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::config::{ConfigStore, FrameworkSettings};
use crate::orchestrator::StageError;
use yggdrasil_config::{merge, parse_overrides, Configuration};

use super::registry::AgentRegistry;

/// Terminal state of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No agent registered under the name
    NotFound,
    /// The agent's loader failed
    ImportFailed,
    /// The agent loaded but declares no entry point
    NoEntryPoint,
    /// The entry point returned successfully
    Completed,
    /// The entry point returned an error or panicked
    InvocationFailed,
    /// A pipeline stage run by the entry point failed
    StageFailed,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }

    /// Process exit code for this outcome.
    ///
    /// Pipeline stage failures always exit 1. Other failures only do so
    /// when `strict` is set.
    pub fn exit_code(&self, strict: bool) -> u8 {
        match self {
            DispatchOutcome::Completed | DispatchOutcome::NoEntryPoint => 0,
            DispatchOutcome::StageFailed => 1,
            DispatchOutcome::NotFound
            | DispatchOutcome::ImportFailed
            | DispatchOutcome::InvocationFailed => u8::from(strict),
        }
    }
}

/// Runs agents from a registry with configuration from a store.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    registry: &'a AgentRegistry,
    store: &'a ConfigStore,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a AgentRegistry, store: &'a ConfigStore) -> Self {
        Self { registry, store }
    }

    /// Dispatch `name` with `positional` arguments.
    ///
    /// `override_tokens` are the `--agent-set` values for this agent only.
    pub fn dispatch<S: AsRef<str>>(
        &self,
        name: &str,
        positional: &[String],
        override_tokens: &[S],
        framework: &Configuration,
    ) -> DispatchOutcome {
        let span = tracing::info_span!("agent", name = %name);
        let _entered = span.enter();

        let agent = match self.registry.load(name) {
            None => {
                tracing::error!("agent '{}' not found", name);
                return DispatchOutcome::NotFound;
            }
            Some(Err(e)) => {
                tracing::error!("failed to import agent '{}': {}", name, e);
                return DispatchOutcome::ImportFailed;
            }
            Some(Ok(agent)) => agent,
        };

        let settings = FrameworkSettings::from_config(framework);
        tracing::debug!(
            "timeout_seconds = {} (advisory, not enforced)",
            settings.timeout_seconds
        );

        let config = resolve_agent_config(self.store, name, agent.defaults(), override_tokens);

        tracing::info!("--- running agent '{}' ---", name);
        let outcome = match agent.entry_point() {
            None => {
                tracing::warn!("agent '{}' has no entry point", name);
                DispatchOutcome::NoEntryPoint
            }
            Some(entry) => {
                match panic::catch_unwind(AssertUnwindSafe(|| entry(positional, &config))) {
                    Ok(Ok(())) => DispatchOutcome::Completed,
                    Ok(Err(e)) => match e.downcast_ref::<StageError>() {
                        Some(stage) => {
                            tracing::error!("agent '{}' aborted: {}", name, stage);
                            DispatchOutcome::StageFailed
                        }
                        None => {
                            tracing::error!("agent '{}' failed: {:#}", name, e);
                            DispatchOutcome::InvocationFailed
                        }
                    },
                    Err(payload) => {
                        tracing::error!(
                            "agent '{}' panicked: {}",
                            name,
                            panic_message(payload.as_ref())
                        );
                        DispatchOutcome::InvocationFailed
                    }
                }
            }
        };
        tracing::info!("--- agent '{}' finished ---", name);

        outcome
    }
}

/// Merge an agent's three configuration layers: declared defaults, the
/// persisted `agents/config/<name>.json`, then the override tokens.
pub fn resolve_agent_config<S: AsRef<str>>(
    store: &ConfigStore,
    name: &str,
    defaults: &Configuration,
    override_tokens: &[S],
) -> Configuration {
    let persisted = store.load_agent_config(name);
    let cli = parse_overrides(override_tokens).config;
    merge(defaults, &[&persisted, &cli])
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, LoadError};
    use crate::layout::ProjectLayout;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use yggdrasil_config::ConfigValue;

    const NO_TOKENS: &[&str] = &[];

    fn store(tmp: &TempDir) -> ConfigStore {
        ConfigStore::new(ProjectLayout::new(tmp.path()))
    }

    #[test]
    fn test_unknown_agent_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let registry = AgentRegistry::new();

        let outcome =
            Dispatcher::new(&registry, &store).dispatch("nope", &[], NO_TOKENS, &Configuration::new());
        assert_eq!(outcome, DispatchOutcome::NotFound);
    }

    #[test]
    fn test_import_failure_contained() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let mut registry = AgentRegistry::new();
        registry.register("broken", || Err(LoadError::Other("bad manifest".to_string())));

        let outcome = Dispatcher::new(&registry, &store).dispatch(
            "broken",
            &[],
            NO_TOKENS,
            &Configuration::new(),
        );
        assert_eq!(outcome, DispatchOutcome::ImportFailed);
    }

    #[test]
    fn test_no_entry_point() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let mut registry = AgentRegistry::new();
        registry.register_agent("inert", || Agent::new("inert"));

        let outcome = Dispatcher::new(&registry, &store).dispatch(
            "inert",
            &[],
            NO_TOKENS,
            &Configuration::new(),
        );
        assert_eq!(outcome, DispatchOutcome::NoEntryPoint);
    }

    #[test]
    fn test_entry_point_receives_args_and_config() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let seen: Arc<Mutex<Option<(Vec<String>, Configuration)>>> = Arc::new(Mutex::new(None));

        let mut registry = AgentRegistry::new();
        let sink = seen.clone();
        registry.register_agent("recorder", move || {
            let sink = sink.clone();
            Agent::new("recorder")
                .with_defaults(yggdrasil_config::parse_overrides(&["greeting=Hello"]).config)
                .with_entry(move |args, config| {
                    *sink.lock().unwrap() = Some((args.to_vec(), config.clone()));
                    Ok(())
                })
        });

        let args = vec!["arg1".to_string(), "arg2".to_string()];
        let outcome = Dispatcher::new(&registry, &store).dispatch(
            "recorder",
            &args,
            &["target=World"],
            &Configuration::new(),
        );

        assert_eq!(outcome, DispatchOutcome::Completed);
        let (got_args, got_config) = seen.lock().unwrap().take().unwrap();
        assert_eq!(got_args, args);
        assert_eq!(got_config["greeting"], ConfigValue::from("Hello"));
        assert_eq!(got_config["target"], ConfigValue::from("World"));
    }

    #[test]
    fn test_entry_error_contained() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let mut registry = AgentRegistry::new();
        registry.register_agent("failing", || {
            Agent::new("failing").with_entry(|_, _| anyhow::bail!("Test Exception"))
        });

        let outcome = Dispatcher::new(&registry, &store).dispatch(
            "failing",
            &[],
            NO_TOKENS,
            &Configuration::new(),
        );
        assert_eq!(outcome, DispatchOutcome::InvocationFailed);
    }

    #[test]
    fn test_entry_panic_contained() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let mut registry = AgentRegistry::new();
        registry.register_agent("panicky", || {
            Agent::new("panicky").with_entry(|_, _| panic!("entry point exploded"))
        });

        let outcome = Dispatcher::new(&registry, &store).dispatch(
            "panicky",
            &[],
            NO_TOKENS,
            &Configuration::new(),
        );
        assert_eq!(outcome, DispatchOutcome::InvocationFailed);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DispatchOutcome::Completed.exit_code(true), 0);
        assert_eq!(DispatchOutcome::NoEntryPoint.exit_code(true), 0);
        assert_eq!(DispatchOutcome::InvocationFailed.exit_code(false), 0);
        assert_eq!(DispatchOutcome::InvocationFailed.exit_code(true), 1);
        assert_eq!(DispatchOutcome::NotFound.exit_code(true), 1);
        assert_eq!(DispatchOutcome::StageFailed.exit_code(false), 1);
    }

    #[test]
    fn test_panic_message_extraction() {
        let owned: Box<dyn Any + Send> = Box::new("boom".to_string());
        let borrowed: Box<dyn Any + Send> = Box::new("bang");
        assert_eq!(panic_message(owned.as_ref()), "boom");
        assert_eq!(panic_message(borrowed.as_ref()), "bang");
    }
}
