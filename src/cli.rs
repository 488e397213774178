//! Command-line surface
//!
//! `yggdrasil [--root DIR] [<agent> [args...]] [--set K=V]... [--agent-set K=V]...`
//!
//! clap handles the flags that come before the agent name. Everything after
//! the agent name is captured verbatim, so `--set`/`--agent-set` occurrences
//! there are pulled out by [`split_flag`].

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::agent::AgentRegistry;
use crate::layout::{ProjectLayout, ROOT_ENV};
use crate::orchestrator::{AGENT_SET_FLAG, SET_FLAG};

#[derive(Debug, Parser)]
#[command(name = "yggdrasil")]
#[command(about = "Agent dispatcher with layered configuration", version)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(long, env = ROOT_ENV, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Override framework configuration
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Override the dispatched agent's configuration
    #[arg(long = "agent-set", value_name = "KEY=VALUE")]
    pub agent_set: Vec<String>,

    /// Agent to run; omit to list the registered agents
    pub agent: Option<String>,

    /// Positional arguments passed to the agent
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// A parsed command line with every flag occurrence collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub agent: Option<String>,
    pub positional: Vec<String>,
    pub set: Vec<String>,
    pub agent_set: Vec<String>,
}

impl Invocation {
    /// Parse `argv` (including the program name).
    pub fn try_parse_from<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Cli::try_parse_from(argv)?.into())
    }

    pub fn layout(&self) -> ProjectLayout {
        match &self.root {
            Some(root) => ProjectLayout::new(root),
            None => ProjectLayout::from_env(),
        }
    }
}

impl From<Cli> for Invocation {
    fn from(cli: Cli) -> Self {
        let (rest, mut set) = split_flag(cli.args, SET_FLAG);
        let (positional, mut agent_set) = split_flag(rest, AGENT_SET_FLAG);

        let mut all_set = cli.set;
        all_set.append(&mut set);
        let mut all_agent_set = cli.agent_set;
        all_agent_set.append(&mut agent_set);

        Self {
            root: cli.root,
            agent: cli.agent,
            positional,
            set: all_set,
            agent_set: all_agent_set,
        }
    }
}

/// Separate `flag VALUE` and `flag=VALUE` occurrences from `args`.
///
/// Returns the remaining arguments and the collected values, both in their
/// original order. A trailing flag with no value is dropped with a warning.
pub fn split_flag(args: Vec<String>, flag: &str) -> (Vec<String>, Vec<String>) {
    let prefix = format!("{}=", flag);
    let mut rest = Vec::new();
    let mut values = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            match iter.next() {
                Some(value) => values.push(value),
                None => tracing::warn!("{} given without a value, ignoring", flag),
            }
        } else if let Some(value) = arg.strip_prefix(&prefix) {
            values.push(value.to_string());
        } else {
            rest.push(arg);
        }
    }

    (rest, values)
}

/// Usage text listing the registered agents.
pub fn usage(registry: &AgentRegistry) -> Vec<String> {
    let mut lines = vec![
        "usage: yggdrasil [--root DIR] <agent> [args...] [--set KEY=VALUE]... [--agent-set KEY=VALUE]..."
            .to_string(),
        String::new(),
        "available agents:".to_string(),
    ];
    lines.extend(registry.names().into_iter().map(|name| format!("  {}", name)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_flag_both_forms() {
        let (rest, values) = split_flag(
            strings(&["a", "--set", "x=1", "b", "--set=y=2", "c"]),
            "--set",
        );
        assert_eq!(rest, strings(&["a", "b", "c"]));
        assert_eq!(values, strings(&["x=1", "y=2"]));
    }

    #[test]
    fn test_split_flag_dangling() {
        let (rest, values) = split_flag(strings(&["a", "--agent-set"]), "--agent-set");
        assert_eq!(rest, strings(&["a"]));
        assert!(values.is_empty());
    }

    #[test]
    fn test_flags_before_and_after_agent() {
        let invocation = Invocation::try_parse_from([
            "yggdrasil",
            "--root",
            "/srv/ygg",
            "--set",
            "logging.level=DEBUG",
            "hello_agent",
            "arg1",
            "--agent-set",
            "target=Moon",
            "--set=agent_execution.strict_exit=true",
            "arg2",
        ])
        .unwrap();

        assert_eq!(invocation.root, Some(PathBuf::from("/srv/ygg")));
        assert_eq!(invocation.agent.as_deref(), Some("hello_agent"));
        assert_eq!(invocation.positional, strings(&["arg1", "arg2"]));
        assert_eq!(
            invocation.set,
            strings(&["logging.level=DEBUG", "agent_execution.strict_exit=true"])
        );
        assert_eq!(invocation.agent_set, strings(&["target=Moon"]));
        assert_eq!(invocation.layout(), ProjectLayout::new("/srv/ygg"));
    }

    #[test]
    fn test_hyphenated_positional_args_kept() {
        let invocation =
            Invocation::try_parse_from(["yggdrasil", "manage_agents", "list", "--verbose"]).unwrap();
        assert_eq!(invocation.positional, strings(&["list", "--verbose"]));
    }

    #[test]
    fn test_no_agent() {
        let invocation = Invocation::try_parse_from(["yggdrasil", "--root", "/tmp"]).unwrap();
        assert!(invocation.agent.is_none());
        assert!(invocation.positional.is_empty());
    }

    #[test]
    fn test_usage_lists_agents() {
        let mut registry = AgentRegistry::new();
        registry.register_agent("b_agent", || Agent::new("b_agent"));
        registry.register_agent("a_agent", || Agent::new("a_agent"));

        let lines = usage(&registry);
        assert!(lines[0].starts_with("usage: yggdrasil"));
        assert_eq!(&lines[lines.len() - 2..], ["  a_agent", "  b_agent"]);
    }
}
