//! Extraction of the embedded configuration from a model artifact

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::artifact::{CONFIG_ITEM, read_items};
use super::error::ModelError;

/// Where a model artifact is read from
#[derive(Debug, Clone, Copy)]
pub enum ModelSource<'a> {
    /// Artifact file on disk
    Path(&'a Path),
    /// Artifact already loaded into memory
    Bytes(&'a [u8]),
}

impl ModelSource<'_> {
    fn origin(&self) -> String {
        match self {
            ModelSource::Path(path) => path.display().to_string(),
            ModelSource::Bytes(_) => "<memory>".to_string(),
        }
    }
}

/// Load the configuration embedded in a model artifact
///
/// Returns `Ok(None)` when the artifact has no [`CONFIG_ITEM`]; that is an
/// ordinary model, not a damaged one. An empty fragment yields an empty
/// mapping.
pub fn load_fragment(source: ModelSource<'_>) -> Result<Option<Mapping>, ModelError> {
    let origin = source.origin();
    let owned;
    let bytes = match source {
        ModelSource::Path(path) => {
            owned = fs::read(path).map_err(|source| ModelError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            owned.as_slice()
        }
        ModelSource::Bytes(bytes) => bytes,
    };

    let items = read_items(bytes, &origin)?;
    let Some(item) = items.into_iter().find(|item| item.name == CONFIG_ITEM) else {
        debug!(origin = %origin, "Model artifact has no embedded configuration");
        return Ok(None);
    };

    let text = item.bytes.strip_suffix(&[0]).unwrap_or(&item.bytes[..]);
    let text = std::str::from_utf8(text).map_err(|_| ModelError::Corrupt {
        origin: origin.clone(),
        message: format!("{CONFIG_ITEM} is not UTF-8"),
    })?;

    let value: Value = serde_yaml::from_str(text).map_err(|source| ModelError::InvalidFragment {
        origin: origin.clone(),
        source,
    })?;
    match value {
        Value::Mapping(mapping) => Ok(Some(mapping)),
        Value::Null => Ok(Some(Mapping::new())),
        _ => Err(ModelError::FragmentNotAMapping { origin }),
    }
}
