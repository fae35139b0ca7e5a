//! Model artifacts and the configuration embedded in them
//!
//! A model artifact is a container of named binary items. Besides the
//! parameters it may carry an item named [`CONFIG_ITEM`] whose payload is the
//! YAML settings the model was trained with. Loading that fragment lets a
//! run pick up the model's own settings on top of its parsed configuration.

mod artifact;
mod error;
mod loader;

pub use artifact::{ArtifactItem, ArtifactWriter, CONFIG_ITEM, FORMAT_VERSION, ItemType, read_items};
pub use error::ModelError;
pub use loader::{ModelSource, load_fragment};
