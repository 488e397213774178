//! Built-in and script agents
//!
//! Built-ins are registered statically. Script agents are discovered once
//! from `<root>/agents/*.toml` manifests when the registry is built.

mod generic_pipeline;
mod hello;
mod manage;
mod model_trainer;
mod pipeline;
pub mod script;

use std::path::PathBuf;

use yggdrasil_config::{flatten_pairs, ConfigValue, Configuration};

use crate::agent::AgentRegistry;
use crate::layout::ProjectLayout;
use crate::orchestrator::resolve_paths;

pub use script::{discover_manifests, load_manifest, register_scripts, ManifestError};

pub const HELLO_AGENT: &str = "hello_agent";
pub const MANAGE_AGENTS: &str = "manage_agents";
pub const MODEL_TRAINER: &str = "model_trainer";
pub const PIPELINE_ORCHESTRATOR: &str = "pipeline_orchestrator";
pub const GENERIC_TRAINING_PIPELINE: &str = "generic_training_pipeline";

/// Register every built-in agent.
pub fn register_builtins(registry: &mut AgentRegistry, layout: &ProjectLayout) {
    registry.register_agent(HELLO_AGENT, hello::agent);

    let root = layout.clone();
    registry.register_agent(MANAGE_AGENTS, move || manage::agent(root.clone()));

    let root = layout.clone();
    registry.register_agent(MODEL_TRAINER, move || model_trainer::agent(root.clone()));

    let root = layout.clone();
    registry.register_agent(PIPELINE_ORCHESTRATOR, move || pipeline::agent(root.clone()));

    let root = layout.clone();
    registry.register_agent(GENERIC_TRAINING_PIPELINE, move || {
        generic_pipeline::agent(root.clone())
    });
}

/// Registry with the built-ins plus the script agents found under `layout`.
pub fn default_registry(layout: &ProjectLayout) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    register_builtins(&mut registry, layout);
    register_scripts(&mut registry, layout);
    registry
}

/// Render `config` as `--key value` arguments for an external program.
///
/// Keys in `skip` and empty strings are left out; path values are made
/// absolute.
pub(crate) fn cli_args(config: &Configuration, layout: &ProjectLayout, skip: &[&str]) -> Vec<String> {
    let resolved = resolve_paths(config, layout);
    let mut args = Vec::new();
    for (key, value) in flatten_pairs(&resolved) {
        if skip.contains(&key.as_str()) {
            continue;
        }
        if matches!(&value, ConfigValue::String(s) if s.is_empty()) {
            continue;
        }
        args.push(format!("--{}", key));
        args.push(value.to_string());
    }
    args
}

/// Resolve a program name: names containing a `/` are paths relative to the
/// project root, bare names are looked up on `PATH`.
pub(crate) fn resolve_program(program: &str, layout: &ProjectLayout) -> PathBuf {
    if program.contains('/') {
        layout.absolutize(program)
    } else {
        PathBuf::from(program)
    }
}

/// Copy the listed keys that are present in `config`.
pub(crate) fn pick(config: &Configuration, keys: &[&str]) -> Configuration {
    keys.iter()
        .filter_map(|key| config.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yggdrasil_config::parse_overrides;

    #[test]
    fn test_builtins_registered() {
        let mut registry = AgentRegistry::new();
        register_builtins(&mut registry, &ProjectLayout::new("/srv/ygg"));

        assert_eq!(
            registry.names(),
            vec![
                GENERIC_TRAINING_PIPELINE,
                HELLO_AGENT,
                MANAGE_AGENTS,
                MODEL_TRAINER,
                PIPELINE_ORCHESTRATOR,
            ]
        );
        for name in registry.names() {
            let agent = registry.load(name).unwrap().unwrap();
            assert_eq!(agent.name(), name);
            assert!(!agent.description().is_empty());
            assert!(agent.entry_point().is_some());
        }
    }

    #[test]
    fn test_cli_args_skip_and_absolutize() {
        let layout = ProjectLayout::new("/srv/ygg");
        let config = parse_overrides(&[
            "script_path=train.py",
            "epochs=2",
            "log_file=logs/run.csv",
            "dataset_path=",
            "learning_rate=0.5",
        ])
        .config;

        let args = cli_args(&config, &layout, &["script_path"]);

        assert_eq!(
            args,
            vec![
                "--epochs",
                "2",
                "--learning_rate",
                "0.5",
                "--log_file",
                "/srv/ygg/logs/run.csv",
            ]
        );
    }

    #[test]
    fn test_resolve_program() {
        let layout = ProjectLayout::new("/srv/ygg");
        assert_eq!(resolve_program("sh", &layout), PathBuf::from("sh"));
        assert_eq!(
            resolve_program(".venv/bin/python", &layout),
            PathBuf::from("/srv/ygg/.venv/bin/python")
        );
        assert_eq!(resolve_program("/bin/sh", &layout), PathBuf::from("/bin/sh"));
    }

    #[test]
    fn test_pick_copies_present_keys() {
        let config = parse_overrides(&["a=1", "b=2"]).config;
        let picked = pick(&config, &["a", "c"]);

        assert_eq!(picked.len(), 1);
        assert_eq!(picked["a"], ConfigValue::Int(1));
    }
}
