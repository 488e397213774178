//! `pipeline_orchestrator`: train, then evaluate.
//!
//! Both stages are `model_trainer` children; a failed stage stops the
//! pipeline and the dispatcher exits non-zero.

use anyhow::Context;
use yggdrasil_config::{parse_overrides, ConfigValue, Configuration};

use crate::agent::Agent;
use crate::layout::ProjectLayout;
use crate::orchestrator::Orchestrator;

use super::pick;

/// Keys forwarded unchanged to every stage when configured.
const SHARED_KEYS: [&str; 1] = ["interpreter"];

/// Keys forwarded to the training stage.
const TRAINING_KEYS: [&str; 4] = ["epochs", "batch_size", "learning_rate", "optimizer_type"];

pub(super) fn agent(layout: ProjectLayout) -> Agent {
    Agent::new(super::PIPELINE_ORCHESTRATOR)
        .with_description("Runs the character recognizer training and evaluation pipeline")
        .with_defaults(defaults())
        .with_entry(move |_args, config| {
            let orchestrator = Orchestrator::from_current_exe(layout.clone())
                .context("cannot locate the dispatcher executable")?;
            run(&orchestrator, config)
        })
}

fn defaults() -> Configuration {
    parse_overrides(&[
        "processed_data_path=data/processed_data.npz",
        "trained_model_path=trained_models/pipeline_model.keras",
        "experiment_log_file=logs/pipeline_experiment_log.csv",
        "epochs=1",
        "batch_size=32",
        "learning_rate=0.001",
        "optimizer_type=adam",
        "train_script_path=training_scripts/character_recognizer.py",
        "eval_script_path=training_scripts/model_evaluator.py",
        "eval_data_path=data/neo_world_characters.npz",
    ])
    .config
}

/// Stage configurations in execution order.
pub(super) fn stages(config: &Configuration) -> [Configuration; 2] {
    let value = |key: &str| config.get(key).cloned().unwrap_or_else(|| ConfigValue::from(""));

    let mut train = pick(config, &SHARED_KEYS);
    train.extend(pick(config, &TRAINING_KEYS));
    train.insert("script_path".into(), value("train_script_path"));
    train.insert("output_path".into(), value("trained_model_path"));
    train.insert("log_file".into(), value("experiment_log_file"));

    let mut evaluate = pick(config, &SHARED_KEYS);
    evaluate.insert("script_path".into(), value("eval_script_path"));
    evaluate.insert("model_path".into(), value("trained_model_path"));
    evaluate.insert("input_data_path".into(), value("eval_data_path"));
    evaluate.insert("log_file".into(), value("experiment_log_file"));

    [train, evaluate]
}

fn run(orchestrator: &Orchestrator, config: &Configuration) -> anyhow::Result<()> {
    tracing::info!("Pipeline Orchestrator Agent: start");
    for stage in stages(config) {
        orchestrator.run_stage(super::MODEL_TRAINER, &stage)?;
    }
    tracing::info!("Pipeline Orchestrator Agent: done");
    Ok(())
}
