//! `hello_agent`: prints a greeting and echoes what it was given.

use yggdrasil_config::{parse_overrides, Configuration};

use crate::agent::Agent;

pub(super) fn agent() -> Agent {
    Agent::new(super::HELLO_AGENT)
        .with_description("Hello World Agent")
        .with_defaults(defaults())
        .with_entry(|args, config| {
            for line in render(args, config)? {
                println!("{}", line);
            }
            Ok(())
        })
}

fn defaults() -> Configuration {
    parse_overrides(&[
        "greeting=Hello",
        "target=World",
        "message=Default message from Hello Agent!",
    ])
    .config
}

fn render(args: &[String], config: &Configuration) -> anyhow::Result<Vec<String>> {
    let field = |key: &str| config.get(key).map(ToString::to_string).unwrap_or_default();

    let mut lines = vec![format!(
        "{} from Hello Agent! (Target: {})",
        field("greeting"),
        field("target")
    )];
    if !args.is_empty() {
        lines.push(format!("Received arguments: {:?}", args));
    }
    lines.push(format!("Final configuration: {}", serde_json::to_string(config)?));
    if config.contains_key("message") {
        lines.push(format!("Configured message: {}", field("message")));
    }
    Ok(lines)
}
