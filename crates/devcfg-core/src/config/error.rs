//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ModelError;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key absent from the settings document
    #[error("Missing configuration key '{key}'")]
    MissingKey { key: String },

    /// Key present but its value does not have the requested type
    #[error("Invalid value for configuration key '{key}': {source}")]
    InvalidValue {
        key: String,
        source: serde_yaml::Error,
    },

    /// Option required by the run mode was not supplied
    #[error("Option '{key}' is required in {mode} mode")]
    MissingRequired { key: String, mode: String },

    /// `log-level` names no known level
    #[error("Invalid log level '{value}' (expected trace, debug, info, warn or error)")]
    InvalidLogLevel { value: String },

    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("YAML parse error in {origin}: {source}")]
    YamlParse {
        origin: String,
        source: serde_yaml::Error,
    },

    /// Settings could not be rendered as YAML
    #[error("YAML emit error: {0}")]
    YamlEmit(serde_yaml::Error),

    /// YAML document is not a key/value mapping
    #[error("Configuration in {origin} must be a mapping of keys to values")]
    NotAMapping { origin: String },

    /// Command-line parsing error
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// Model artifact could not be read
    #[error(transparent)]
    Model(#[from] ModelError),
}
