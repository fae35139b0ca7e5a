//! Error types for model artifact access

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a model artifact
#[derive(Error, Debug)]
pub enum ModelError {
    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Container is truncated or its headers are inconsistent
    #[error("Corrupt model artifact {origin}: {message}")]
    Corrupt { origin: String, message: String },

    /// Container was written with a format version this build cannot read
    #[error("Unsupported model artifact version {version} in {origin}")]
    UnsupportedVersion { origin: String, version: u64 },

    /// Embedded configuration is not valid YAML
    #[error("Invalid embedded configuration in {origin}: {source}")]
    InvalidFragment {
        origin: String,
        source: serde_yaml::Error,
    },

    /// Embedded configuration is not a key/value mapping
    #[error("Embedded configuration in {origin} must be a mapping of keys to values")]
    FragmentNotAMapping { origin: String },
}
