//! `model_trainer`: runs an external training script.
//!
//! The script is started as `<interpreter> <script_path> --key value ...`
//! with every other configured key passed through. Its output is relayed
//! line by line.

use std::io;
use std::process::Command;

use anyhow::{bail, Context};
use yggdrasil_config::{parse_overrides, Configuration};

use crate::agent::Agent;
use crate::layout::ProjectLayout;
use crate::orchestrator::run_relayed;

use super::{cli_args, resolve_program};

const SCRIPT_PATH: &str = "script_path";
const INTERPRETER: &str = "interpreter";

pub(super) fn agent(layout: ProjectLayout) -> Agent {
    Agent::new(super::MODEL_TRAINER)
        .with_description("Runs an external training script with the configured parameters")
        .with_defaults(defaults())
        .with_entry(move |_args, config| run(config, &layout))
}

fn defaults() -> Configuration {
    parse_overrides(&[
        "script_path=training_scripts/mnist_trainer.py",
        "interpreter=.venv/bin/python",
    ])
    .config
}

/// Build the script invocation. Fails when no script is configured or the
/// script does not exist.
pub(super) fn training_command(
    config: &Configuration,
    layout: &ProjectLayout,
) -> anyhow::Result<Command> {
    let script = match config.get(SCRIPT_PATH).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => layout.absolutize(s),
        _ => bail!("no training script configured ({} is empty)", SCRIPT_PATH),
    };
    if !script.is_file() {
        bail!("training script not found: {}", script.display());
    }

    let interpreter = config
        .get(INTERPRETER)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .context("no interpreter configured")?;

    let mut command = Command::new(resolve_program(interpreter, layout));
    command
        .arg(&script)
        .args(cli_args(config, layout, &[SCRIPT_PATH, INTERPRETER]))
        .current_dir(layout.root());
    Ok(command)
}

fn run(config: &Configuration, layout: &ProjectLayout) -> anyhow::Result<()> {
    tracing::info!("Model Trainer Agent: start");

    let command = training_command(config, layout)?;
    let rendered = std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!("command: {}", rendered);

    let stdout = io::stdout();
    let report = run_relayed(command, &mut stdout.lock()).context("training script failed")?;
    tracing::debug!("training script produced {} lines", report.lines.len());

    tracing::info!("Model Trainer Agent: done");
    Ok(())
}
