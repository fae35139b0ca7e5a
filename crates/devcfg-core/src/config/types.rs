//! Configuration types

use std::fmt;

/// Mode a process runs in, fixed when the configuration is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Model training
    Training,
    /// Batch translation with one or more models
    Translation,
    /// Translation served over a socket
    Server,
    /// Scoring of existing sentence pairs
    Scoring,
}

impl RunMode {
    /// Whether the mode names its models with the `models` list instead of `model`
    pub fn uses_model_list(self) -> bool {
        matches!(self, RunMode::Translation | RunMode::Server)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Training => "training",
            RunMode::Translation => "translation",
            RunMode::Server => "server",
            RunMode::Scoring => "scoring",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
