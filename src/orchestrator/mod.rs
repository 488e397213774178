//! Pipeline stage orchestration
//!
//! A pipeline agent runs each stage by re-invoking the dispatcher binary as a
//! child process: `yggdrasil <agent> --set agent_execution.strict_exit=true
//! --agent-set k=v ...`. The child's output is relayed to our stdout as it is
//! produced and a failed stage aborts the pipeline.

mod relay;

pub use relay::{run_relayed, ChildError, RelayReport};

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

use yggdrasil_config::{flatten, ConfigValue, Configuration};

use crate::layout::{ProjectLayout, ROOT_ENV};

/// Flag carrying framework overrides to a child.
pub const SET_FLAG: &str = "--set";

/// Flag carrying agent overrides to a child.
pub const AGENT_SET_FLAG: &str = "--agent-set";

/// Forced on every stage so agent failures surface as non-zero exits.
pub const STRICT_EXIT_OVERRIDE: &str = "agent_execution.strict_exit=true";

/// Key fragments marking a value as a filesystem path.
const PATH_KEY_MARKERS: [&str; 2] = ["path", "file"];

/// A pipeline stage that could not be run to a successful exit
#[derive(Debug, thiserror::Error)]
#[error("stage '{agent}' failed: {source}")]
pub struct StageError {
    pub agent: String,
    #[source]
    pub source: ChildError,
}

/// A fully built stage invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl StageCommand {
    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Rewrite relative path values to absolute paths under the project root.
///
/// Applies to string values whose key contains `path` or `file`, at any
/// nesting depth. Empty strings and absolute paths are left alone.
pub fn resolve_paths(config: &Configuration, layout: &ProjectLayout) -> Configuration {
    config
        .iter()
        .map(|(key, value)| {
            let resolved = match value {
                ConfigValue::Map(inner) => ConfigValue::Map(resolve_paths(inner, layout)),
                ConfigValue::String(s) if !s.is_empty() && is_path_key(key) => {
                    ConfigValue::String(layout.absolutize(s).to_string_lossy().into_owned())
                }
                other => other.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}

/// Whether `key` names a filesystem path.
pub fn is_path_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    PATH_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Runs pipeline stages as child dispatcher processes
#[derive(Debug, Clone)]
pub struct Orchestrator {
    executable: PathBuf,
    layout: ProjectLayout,
}

impl Orchestrator {
    pub fn new(executable: impl Into<PathBuf>, layout: ProjectLayout) -> Self {
        Self {
            executable: executable.into(),
            layout,
        }
    }

    /// Orchestrator re-invoking the running binary.
    pub fn from_current_exe(layout: ProjectLayout) -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, layout))
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Build the child invocation for `agent`. Path values are absolutized
    /// before flattening.
    pub fn stage_command(&self, agent: &str, config: &Configuration) -> StageCommand {
        let resolved = resolve_paths(config, &self.layout);

        let mut args = vec![
            agent.to_string(),
            SET_FLAG.to_string(),
            STRICT_EXIT_OVERRIDE.to_string(),
        ];
        for token in flatten(&resolved) {
            args.push(AGENT_SET_FLAG.to_string());
            args.push(token);
        }

        StageCommand {
            program: self.executable.clone(),
            args,
        }
    }

    /// Run one stage, relaying its output to stdout.
    pub fn run_stage(&self, agent: &str, config: &Configuration) -> Result<RelayReport, StageError> {
        let stdout = io::stdout();
        let mut sink = stdout.lock();
        self.run_stage_with(agent, config, &mut sink)
    }

    /// Run one stage, relaying its output to `sink`.
    ///
    /// Failures are logged here: spawn failures and non-zero exits get
    /// distinct messages, the latter followed by the captured output.
    pub fn run_stage_with<W: Write>(
        &self,
        agent: &str,
        config: &Configuration,
        sink: &mut W,
    ) -> Result<RelayReport, StageError> {
        let stage = self.stage_command(agent, config);
        tracing::info!("--- stage '{}' ---", agent);
        tracing::info!("command: {}", stage.display());

        let mut command = Command::new(&stage.program);
        command
            .args(&stage.args)
            .env(ROOT_ENV, self.layout.root());

        match run_relayed(command, sink) {
            Ok(report) => {
                tracing::info!(
                    "stage '{}' finished: started {}, {} ms, {} lines of output",
                    agent,
                    report.started_at.format("%Y-%m-%d %H:%M:%S"),
                    report.duration_ms(),
                    report.lines.len()
                );
                Ok(report)
            }
            Err(source) => {
                match &source {
                    ChildError::Spawn { program, source } => {
                        tracing::error!("could not start stage '{}' ({}): {}", agent, program, source);
                    }
                    ChildError::NonZeroExit { status, output, .. } => {
                        tracing::error!("stage '{}' failed with {}", agent, status);
                        if !output.is_empty() {
                            tracing::error!("captured output of '{}':\n{}", agent, output.join("\n"));
                        }
                    }
                    ChildError::Io { source, .. } => {
                        tracing::error!("lost output of stage '{}': {}", agent, source);
                    }
                }
                Err(StageError {
                    agent: agent.to_string(),
                    source,
                })
            }
        }
    }
}
