//! Process-level tracing set up from the run's settings
//!
//! The `log-level` and `log` settings choose verbosity and an optional log
//! file. Commands that run without settings fall back to `DEVCFG_LOG`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::config::{ConfigError, Settings};

static INIT: OnceLock<()> = OnceLock::new();

fn parse_level(value: &str) -> Option<tracing::Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "error" | "critical" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn env_level() -> tracing::Level {
    std::env::var("DEVCFG_LOG")
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(tracing::Level::INFO)
}

/// Install the subscriber for a run described by `settings`
///
/// Logs go to stderr and, when `log` is non-empty, are appended to that file
/// too. Without a `log-level` key the level comes from `DEVCFG_LOG`. Only
/// the first successful call in a process installs a subscriber.
pub fn init(settings: &Settings) -> Result<(), ConfigError> {
    let level = if settings.has("log-level") {
        let value = settings.get_str("log-level")?;
        parse_level(&value).ok_or(ConfigError::InvalidLogLevel { value })?
    } else {
        env_level()
    };

    if INIT.get().is_some() {
        return Ok(());
    }

    let log_file = if settings.has("log") {
        settings.get_str("log")?
    } else {
        String::new()
    };

    if log_file.is_empty() {
        install(level, BoxMakeWriter::new(std::io::stderr), true);
    } else {
        let path = Path::new(&log_file);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let writer = std::io::stderr.and(Arc::new(file));
        install(level, BoxMakeWriter::new(writer), false);
    }
    Ok(())
}

/// Install a stderr subscriber with the level from `DEVCFG_LOG`
pub fn init_from_env() {
    if INIT.get().is_some() {
        return;
    }
    install(env_level(), BoxMakeWriter::new(std::io::stderr), true);
}

fn install(level: tracing::Level, writer: BoxMakeWriter, ansi: bool) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .try_init();
    let _ = INIT.set(());
}
