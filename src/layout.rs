//! Project directory layout
//!
//! Every persisted file lives at a deterministic path under the project root:
//!
//! ```text
//! <root>/config/framework_config.json   framework configuration
//! <root>/agents/config/<agent>.json     per-agent configuration
//! <root>/agents/<agent>.toml            script agent manifests
//! <root>/logs/yggdrasil.log             persisted log
//! ```

use std::path::{Path, PathBuf};

/// Environment variable naming the project root.
pub const ROOT_ENV: &str = "YGGDRASIL_ROOT";

/// Framework configuration file name (under `config/`).
pub const FRAMEWORK_CONFIG_FILE: &str = "framework_config.json";

/// Log file name (under `logs/`).
pub const LOG_FILE: &str = "yggdrasil.log";

/// Paths derived from a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// A relative `root` is resolved against the current directory so every
    /// derived path is absolute.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(root),
                Err(_) => root,
            }
        };
        Self { root }
    }

    /// Root from `YGGDRASIL_ROOT`, falling back to the current directory.
    pub fn from_env() -> Self {
        let root = std::env::var_os(ROOT_ENV)
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn framework_config_path(&self) -> PathBuf {
        self.config_dir().join(FRAMEWORK_CONFIG_FILE)
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn agent_config_dir(&self) -> PathBuf {
        self.agents_dir().join("config")
    }

    pub fn agent_config_path(&self, agent: &str) -> PathBuf {
        self.agent_config_dir().join(format!("{}.json", agent))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Make `path` absolute by joining it onto the root. Absolute paths are
    /// returned unchanged.
    pub fn absolutize(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}
