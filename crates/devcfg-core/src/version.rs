//! Version compatibility reporting for loaded model artifacts
//!
//! The `version` key is only present when settings were loaded from a model
//! artifact; it records the build that created the model.

use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::config::{RunMode, Settings};

/// Version string of the running build
pub const BUILD_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Outcome of comparing a model's recorded version with the running build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionReport {
    /// Training continues a model from another build; it is rewritten on save
    Upgrade {
        model_version: String,
        build_version: String,
    },
    /// Model was loaded and its version is recorded
    Loaded { model_version: String },
    /// Training starts a new model with the running build
    Created { build_version: String },
    /// Nothing to report
    Silent,
}

impl VersionReport {
    /// Emit the report as an informational log line
    pub fn log(&self) {
        match self {
            VersionReport::Upgrade {
                model_version,
                build_version,
            } => info!(
                "[config] Loaded model has been created with version {model_version}, \
                 will be overwritten with current version {build_version} at saving"
            ),
            VersionReport::Loaded { model_version } => {
                info!("[config] Loaded model has been created with version {model_version}")
            }
            VersionReport::Created { build_version } => {
                info!("[config] Model is being created with version {build_version}")
            }
            VersionReport::Silent => {}
        }
    }
}

/// Compare the model version recorded in `settings` with `build_version`
pub fn check_model_version(settings: &Settings, mode: RunMode, build_version: &str) -> VersionReport {
    match settings.get("version").ok() {
        Some(value) => {
            let model_version = version_text(value);
            if mode == RunMode::Training && model_version != build_version {
                VersionReport::Upgrade {
                    model_version,
                    build_version: build_version.to_string(),
                }
            } else {
                VersionReport::Loaded { model_version }
            }
        }
        None if mode == RunMode::Training => VersionReport::Created {
            build_version: build_version.to_string(),
        },
        None => VersionReport::Silent,
    }
}

/// Check against [`BUILD_VERSION`] and log the result
pub fn log_model_version(settings: &Settings, mode: RunMode) -> VersionReport {
    let report = check_model_version(settings, mode, BUILD_VERSION);
    report.log();
    report
}

/// Record the running build in a configuration about to be embedded in a model
pub fn stamp_version(config: &mut Mapping) {
    config.insert(Value::from("version"), Value::from(BUILD_VERSION));
}

fn version_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
