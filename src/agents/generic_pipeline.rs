//! `generic_training_pipeline`: one `model_trainer` stage driven entirely by
//! configuration. Evaluation is left to the training script itself.

use anyhow::Context;
use yggdrasil_config::{parse_overrides, ConfigValue, Configuration};

use crate::agent::Agent;
use crate::layout::ProjectLayout;
use crate::orchestrator::Orchestrator;

use super::pick;

const FORWARDED_KEYS: [&str; 7] = [
    "interpreter",
    "dataset_path",
    "log_file",
    "epochs",
    "batch_size",
    "learning_rate",
    "optimizer_type",
];

pub(super) fn agent(layout: ProjectLayout) -> Agent {
    Agent::new(super::GENERIC_TRAINING_PIPELINE)
        .with_description("Runs a configurable training script as a pipeline stage")
        .with_defaults(defaults())
        .with_entry(move |_args, config| {
            let orchestrator = Orchestrator::from_current_exe(layout.clone())
                .context("cannot locate the dispatcher executable")?;
            run(&orchestrator, config)
        })
}

fn defaults() -> Configuration {
    parse_overrides(&[
        "model_type=",
        "training_script_path=",
        "evaluation_script_path=",
        "dataset_path=",
        "output_model_path=trained_models/generic_model.keras",
        "log_file=logs/generic_pipeline_log.csv",
        "epochs=10",
        "batch_size=32",
        "learning_rate=0.001",
        "optimizer_type=adam",
    ])
    .config
}

/// The training stage, or `None` when no training script is configured.
pub(super) fn training_stage(config: &Configuration) -> Option<Configuration> {
    let script = config
        .get("training_script_path")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())?;

    let mut stage = pick(config, &FORWARDED_KEYS);
    stage.insert("script_path".into(), ConfigValue::from(script));
    if let Some(output) = config.get("output_model_path") {
        stage.insert("output_path".into(), output.clone());
    }
    Some(stage)
}

fn run(orchestrator: &Orchestrator, config: &Configuration) -> anyhow::Result<()> {
    tracing::info!("Generic Training Pipeline Agent: start");
    match training_stage(config) {
        Some(stage) => {
            orchestrator.run_stage(super::MODEL_TRAINER, &stage)?;
        }
        None => tracing::warn!("no training_script_path configured, skipping the training stage"),
    }
    tracing::info!("Generic Training Pipeline Agent: done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yggdrasil_config::merge;

    #[test]
    fn test_no_script_no_stage() {
        assert!(training_stage(&defaults()).is_none());
    }

    #[test]
    fn test_stage_from_config() {
        let overrides =
            parse_overrides(&["training_script_path=training_scripts/generic_trainer.py", "epochs=2"])
                .config;
        let config = merge(&defaults(), &[&overrides]);

        let stage = training_stage(&config).unwrap();

        assert_eq!(
            stage["script_path"],
            ConfigValue::from("training_scripts/generic_trainer.py")
        );
        assert_eq!(
            stage["output_path"],
            ConfigValue::from("trained_models/generic_model.keras")
        );
        assert_eq!(stage["epochs"], ConfigValue::Int(2));
        assert_eq!(stage["dataset_path"], ConfigValue::from(""));
        assert!(!stage.contains_key("model_type"));
    }
}
