//! Yggdrasil CLI
//!
//! Entry point for the `yggdrasil` agent dispatcher.

use std::process::ExitCode;

use clap::Parser;
use yggdrasil::agents::default_registry;
use yggdrasil::cli::{usage, Cli, Invocation};
use yggdrasil::config::resolve_framework_config;
use yggdrasil::logging::{self, LogSettings};
use yggdrasil::{ConfigStore, Dispatcher, FrameworkSettings};

fn main() -> ExitCode {
    let invocation = Invocation::from(Cli::parse());
    let layout = invocation.layout();

    logging::init(&LogSettings::from_env(&layout));
    tracing::debug!("project root: {}", layout.root().display());

    let store = ConfigStore::new(layout.clone());
    let framework = resolve_framework_config(&store, &invocation.set);
    let settings = FrameworkSettings::from_config(&framework);
    tracing::debug!("framework settings: {:?}", settings);

    let registry = default_registry(&layout);

    let Some(agent) = invocation.agent.as_deref() else {
        for line in usage(&registry) {
            println!("{}", line);
        }
        return ExitCode::SUCCESS;
    };

    let outcome = Dispatcher::new(&registry, &store).dispatch(
        agent,
        &invocation.positional,
        &invocation.agent_set,
        &framework,
    );
    tracing::debug!("dispatch outcome: {:?}", outcome);

    ExitCode::from(outcome.exit_code(settings.strict_exit))
}
