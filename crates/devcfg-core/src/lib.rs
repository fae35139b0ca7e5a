//! Core settings and device assignment for devcfg
//!
//! This crate owns the single settings document a run is driven by and the
//! algorithm that maps it onto the compute devices of one process:
//!
//! - Merge built-in defaults, YAML config files and command-line options
//! - Override settings from the configuration embedded in a model artifact
//! - Resolve the CPU threads or GPU indices assigned to an MPI rank
//! - Report version compatibility of loaded model artifacts

pub mod config;
pub mod device;
pub mod logging;
pub mod model;
pub mod version;

pub use config::{Config, ConfigError, ConfigParser, RunMode, Settings};
pub use device::{DeviceConfigError, DeviceId, DeviceKind, ProcessTopology, resolve_devices};
pub use model::{ModelError, ModelSource};

// Re-export serde_yaml for callers building settings documents
pub use serde_yaml;
