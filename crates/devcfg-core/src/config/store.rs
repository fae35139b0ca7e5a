//! Settings store: the merged key/value document of a run

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use super::error::ConfigError;

/// Ordered key/value settings document
///
/// Top-level keys are unique. Insertion order is kept so that logged and
/// saved output is deterministic, but no consumer depends on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    document: Mapping,
}

impl Settings {
    /// Create an empty settings document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing YAML mapping
    pub fn from_mapping(document: Mapping) -> Self {
        Self { document }
    }

    /// Parse settings from YAML text
    ///
    /// `origin` names the source in error messages. An empty document yields
    /// empty settings.
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_mapping(parse_mapping(yaml, origin)?))
    }

    /// Load settings previously written with [`Settings::save`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents, &path.display().to_string())
    }

    /// Whether `key` is present at top level
    pub fn has(&self, key: &str) -> bool {
        self.document.contains_key(key)
    }

    /// Raw value of `key`
    pub fn get(&self, key: &str) -> Result<&Value, ConfigError> {
        self.document.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Value of `key` converted to `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get(key)?;
        serde_yaml::from_value(value.clone()).map_err(|source| ConfigError::InvalidValue {
            key: key.to_string(),
            source,
        })
    }

    pub fn get_str(&self, key: &str) -> Result<String, ConfigError> {
        self.get_as(key)
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, ConfigError> {
        self.get_as(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.get_as(key)
    }

    pub fn get_strings(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        self.get_as(key)
    }

    /// Set `key`, replacing any previous value in full
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.document.insert(Value::String(key.to_string()), value.into());
    }

    /// Whole-document read access
    pub fn document(&self) -> &Mapping {
        &self.document
    }

    /// Whole-document write access
    pub fn document_mut(&mut self) -> &mut Mapping {
        &mut self.document
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Serialize the full document as YAML text
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.document).map_err(ConfigError::YamlEmit)
    }

    /// Write the full document as YAML to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml_string()?;
        fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Log the document one YAML line at a time, each prefixed with `[config]`
    pub fn log(&self) {
        match self.to_yaml_string() {
            Ok(yaml) => {
                for line in yaml.lines() {
                    info!("[config] {line}");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to render configuration for logging"),
        }
    }
}

/// Parse YAML text that must hold a top-level mapping
pub(crate) fn parse_mapping(yaml: &str, origin: &str) -> Result<Mapping, ConfigError> {
    let value: Value = serde_yaml::from_str(yaml).map_err(|source| ConfigError::YamlParse {
        origin: origin.to_string(),
        source,
    })?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::NotAMapping {
            origin: origin.to_string(),
        }),
    }
}
