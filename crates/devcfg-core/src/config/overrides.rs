//! Top-level override of settings from a secondary document

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use super::store::Settings;

/// Apply every top-level key of `params` onto `settings`
///
/// Later writes win and values are replaced wholesale: a nested mapping in
/// `params` replaces the existing nested mapping instead of being merged into
/// it. Applying the same document twice leaves the same state as once.
pub fn override_settings(settings: &mut Settings, params: &Mapping) {
    for (key, value) in params {
        match key_name(key) {
            Some(name) => {
                debug!(key = %name, "Overriding configuration key");
                settings.set(&name, value.clone());
            }
            None => warn!(?key, "Ignoring non-scalar configuration key"),
        }
    }
}

/// Render a scalar YAML key as the string form used by the settings store
fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Settings {
    /// See [`override_settings`]
    pub fn override_with(&mut self, params: &Mapping) {
        override_settings(self, params);
    }
}
