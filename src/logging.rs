//! Logging setup
//!
//! One subscriber is installed at process entry. Events go to stdout (so a
//! parent dispatcher relaying this process sees them in order with the
//! agent's own output) and are appended to `logs/yggdrasil.log`.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::layout::{ProjectLayout, LOG_FILE};

/// Environment variable selecting the minimum severity.
pub const LOG_LEVEL_ENV: &str = "YGGDRASIL_LOG_LEVEL";

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Minimum severity printed and persisted
    pub level: Level,

    /// Persisted log file; `None` disables the file layer
    pub log_file: Option<PathBuf>,
}

impl LogSettings {
    /// Level from `YGGDRASIL_LOG_LEVEL`, file under the layout's log dir.
    pub fn from_env(layout: &ProjectLayout) -> Self {
        let level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|raw| parse_level(&raw))
            .unwrap_or(Level::INFO);

        Self {
            level,
            log_file: Some(layout.logs_dir().join(LOG_FILE)),
        }
    }
}

/// Map a severity name onto a tracing level.
///
/// `CRITICAL` has no tracing counterpart and maps to `ERROR`.
pub fn parse_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARNING" | "WARN" => Some(Level::WARN),
        "ERROR" | "CRITICAL" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber. The minimum severity comes from
/// `settings` alone; `RUST_LOG` is not consulted.
pub fn init(settings: &LogSettings) {
    let file_layer = settings.log_file.as_ref().and_then(|path| match open_log_file(path) {
        Ok(appender) => Some(fmt::layer().with_ansi(false).with_writer(appender)),
        Err(e) => {
            eprintln!("warning: file logging disabled: {}", e);
            None
        }
    });

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(io::stdout().is_terminal())
                .with_writer(io::stdout),
        )
        .with(file_layer)
        .with(level_filter(settings.level))
        .try_init();
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy("")
}

fn open_log_file(path: &std::path::Path) -> Result<RollingFileAppender, String> {
    let dir = path
        .parent()
        .ok_or_else(|| format!("{} has no parent directory", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("{} has no file name", path.display()))?;

    fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("info"), Some(Level::INFO));
        assert_eq!(parse_level("Warning"), Some(Level::WARN));
        assert_eq!(parse_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_level("CRITICAL"), Some(Level::ERROR));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_level_filter_uses_settings_level() {
        let error_only = tracing_subscriber::registry().with(level_filter(Level::ERROR));
        tracing::subscriber::with_default(error_only, || {
            assert!(tracing::enabled!(Level::ERROR));
            assert!(!tracing::enabled!(Level::INFO));
        });

        let debug = tracing_subscriber::registry().with(level_filter(Level::DEBUG));
        tracing::subscriber::with_default(debug, || {
            assert!(tracing::enabled!(Level::DEBUG));
            assert!(!tracing::enabled!(Level::TRACE));
        });
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logs").join(LOG_FILE);

        assert!(open_log_file(&path).is_ok());
        assert!(tmp.path().join("logs").is_dir());
    }
}
