//! Script agents
//!
//! A script agent is declared by a manifest at `<root>/agents/<name>.toml`:
//!
//! ```toml
//! description = "Summarize a CSV file"
//! command = ["sh", "scripts/summarize.sh"]
//!
//! [defaults]
//! input_file = "data/sample.csv"
//! ```
//!
//! The entry point runs `command`, then the positional arguments, then one
//! `--key value` pair per configuration leaf. A manifest without `command`
//! declares an agent with no entry point.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::agent::{Agent, AgentRegistry, LoadError};
use crate::config::toml_to_config;
use crate::layout::ProjectLayout;
use crate::orchestrator::run_relayed;

use super::{cli_args, resolve_program};

/// Errors reading a script agent manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("manifest {} has an empty command", .path.display())]
    EmptyCommand { path: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    description: String,
    command: Option<Vec<String>>,
    #[serde(default)]
    defaults: toml::Table,
}

/// Manifests directly under `agents_dir`, as `(agent_name, path)` sorted by
/// name. A missing directory yields nothing.
pub fn discover_manifests(agents_dir: &Path) -> Vec<(String, PathBuf)> {
    if !agents_dir.is_dir() {
        return Vec::new();
    }

    let mut found: Vec<(String, PathBuf)> = WalkDir::new(agents_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry in {}: {}", agents_dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|entry| {
            let name = entry.path().file_stem()?.to_str()?.to_string();
            Some((name, entry.into_path()))
        })
        .collect();

    found.sort();
    found
}

/// Register a loader for every manifest under the layout's agents dir.
///
/// Names already registered (the built-ins) take precedence.
pub fn register_scripts(registry: &mut AgentRegistry, layout: &ProjectLayout) {
    for (name, path) in discover_manifests(&layout.agents_dir()) {
        if registry.contains(&name) {
            tracing::warn!(
                "script agent {} ignored: '{}' is already registered",
                path.display(),
                name
            );
            continue;
        }

        tracing::debug!("registering script agent '{}' from {}", name, path.display());
        let root = layout.clone();
        let agent_name = name.clone();
        registry.register(name, move || load_manifest(&agent_name, &path, &root));
    }
}

/// Load the agent declared by the manifest at `path`.
pub fn load_manifest(name: &str, path: &Path, layout: &ProjectLayout) -> Result<Agent, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Manifest = toml::from_str(&contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let agent = Agent::new(name)
        .with_description(manifest.description)
        .with_defaults(toml_to_config(manifest.defaults));

    let Some(command) = manifest.command else {
        return Ok(agent);
    };
    if command.is_empty() {
        return Err(ManifestError::EmptyCommand {
            path: path.to_path_buf(),
        }
        .into());
    }

    let layout = layout.clone();
    Ok(agent.with_entry(move |args, config| {
        let mut child = Command::new(resolve_program(&command[0], &layout));
        child
            .args(&command[1..])
            .args(args)
            .args(cli_args(config, &layout, &[]))
            .current_dir(layout.root());

        let stdout = io::stdout();
        run_relayed(child, &mut stdout.lock())
            .with_context(|| format!("script command '{}' failed", command.join(" ")))?;
        Ok(())
    }))
}
