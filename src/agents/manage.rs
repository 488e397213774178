//! `manage_agents`: list registered agents or scaffold a script agent.

use std::fs;

use anyhow::{bail, Context};

use crate::agent::Agent;
use crate::layout::ProjectLayout;

const USAGE: &[&str] = &[
    "usage: manage_agents <command> [args...]",
    "commands:",
    "  list           list the available agents",
    "  create <name>  scaffold a new script agent manifest",
];

pub(super) fn agent(layout: ProjectLayout) -> Agent {
    Agent::new(super::MANAGE_AGENTS)
        .with_description("Agent for managing other agents (list, create)")
        .with_entry(move |args, _config| match args.first().map(String::as_str) {
            None => {
                for line in USAGE {
                    println!("{}", line);
                }
                Ok(())
            }
            Some("list") => {
                for line in list_agents(&layout) {
                    println!("{}", line);
                }
                Ok(())
            }
            Some("create") => match args.get(1) {
                Some(name) => create_agent(&layout, name),
                None => bail!("'create' needs an agent name"),
            },
            Some(other) => bail!("unknown command '{}'", other),
        })
}

/// One line per registered agent: name and description.
fn list_agents(layout: &ProjectLayout) -> Vec<String> {
    let registry = super::default_registry(layout);
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);

    let mut lines = vec!["--- available agents ---".to_string()];
    for name in registry.names() {
        let description = match registry.load(name) {
            Some(Ok(agent)) => agent.description().to_string(),
            Some(Err(e)) => format!("(failed to load: {})", e),
            None => continue,
        };
        lines.push(format!("- {:width$}  {}", name, description, width = width));
    }
    lines
}

/// Write a manifest template for a new script agent.
fn create_agent(layout: &ProjectLayout, name: &str) -> anyhow::Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        bail!("invalid agent name '{}'", name);
    }
    if super::default_registry(layout).contains(name) {
        bail!("agent '{}' already exists", name);
    }

    let dir = layout.agents_dir();
    fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let path = dir.join(format!("{}.toml", name));
    fs::write(&path, manifest_template(name))
        .with_context(|| format!("cannot write {}", path.display()))?;

    tracing::info!("created agent '{}': {}", name, path.display());
    Ok(())
}

fn manifest_template(name: &str) -> String {
    format!(
        r#"description = "{name} Agent"
command = ["echo", "Hello from {name} Agent!"]

[defaults]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_includes_builtins_and_scripts() {
        let tmp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(tmp.path());
        fs::create_dir_all(layout.agents_dir()).unwrap();
        fs::write(layout.agents_dir().join("custom.toml"), "description = \"Custom\"\n").unwrap();

        let lines = list_agents(&layout);

        assert!(lines.iter().any(|l| l.starts_with("- hello_agent") && l.ends_with("Hello World Agent")));
        assert!(lines.iter().any(|l| l.starts_with("- custom") && l.ends_with("Custom")));
    }

    #[test]
    fn test_create_writes_loadable_manifest() {
        let tmp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(tmp.path());

        create_agent(&layout, "my_agent").unwrap();

        let registry = crate::agents::default_registry(&layout);
        let agent = registry.load("my_agent").unwrap().unwrap();
        assert_eq!(agent.description(), "my_agent Agent");
        assert!(agent.entry_point().is_some());
    }

    #[test]
    fn test_create_rejects_existing_and_invalid_names() {
        let tmp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(tmp.path());

        assert!(create_agent(&layout, "hello_agent").is_err());
        assert!(create_agent(&layout, "../escape").is_err());
        assert!(create_agent(&layout, "").is_err());

        create_agent(&layout, "twice").unwrap();
        assert!(create_agent(&layout, "twice").is_err());
    }
}
