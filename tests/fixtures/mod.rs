//! Shared test fixtures
//!
//! - Throwaway project roots with persisted configuration and scripts
//! - A `tracing` layer recording every event for assertions on logs
//! - A handle on the compiled `yggdrasil` binary

#![allow(dead_code)]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use yggdrasil::ProjectLayout;

/// A project root in a temporary directory
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.root())
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().expect("path has a parent")).expect("create dirs");
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn write_framework_config(&self, json: &str) -> PathBuf {
        self.write("config/framework_config.json", json)
    }

    pub fn write_agent_config(&self, agent: &str, json: &str) -> PathBuf {
        self.write(&format!("agents/config/{}.json", agent), json)
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).expect("read fixture file")
    }
}

/// One recorded log event
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Events recorded by a [`CaptureLayer`]
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("capture lock").clone()
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.at(Level::ERROR)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.at(Level::WARN)
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.logs.events.lock().expect("capture lock").push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

/// Run `f` with a scoped subscriber recording every event.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer { logs: logs.clone() });
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs)
}

/// Command running the compiled binary against `project`.
pub fn yggdrasil(project: &Project) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_yggdrasil"));
    command
        .env("YGGDRASIL_ROOT", project.root())
        .env_remove("YGGDRASIL_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .current_dir(project.root());
    command
}

/// Run the binary with `args` and collect its output.
pub fn run(project: &Project, args: &[&str]) -> Output {
    yggdrasil(project).args(args).output().expect("run yggdrasil")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
