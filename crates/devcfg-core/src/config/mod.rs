//! Configuration resolution
//!
//! Builds the settings document for a run from several sources with priority:
//! 1. Command-line options
//! 2. YAML config files given with `--config`
//! 3. Built-in defaults for the run mode
//!
//! After parsing, the configuration embedded in a model artifact may replace
//! top-level keys wholesale (see [`override_settings`]).

mod error;
mod overrides;
mod parser;
mod session;
mod store;
mod types;

pub use error::ConfigError;
pub use overrides::override_settings;
pub use parser::{
    CommonOptions, ConfigParser, ModeOptions, ScoringOptions, ServerOptions, TrainingOptions,
    TranslationOptions,
};
pub use session::Config;
pub use store::Settings;
pub use types::RunMode;
