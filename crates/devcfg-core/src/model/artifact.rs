//! Binary container format for model artifacts
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! u64 format version
//! u64 item count
//! per item: u64 name length (with NUL), u64 type tag, u64 shape rank, u64 data length
//! item names, each NUL-terminated
//! item shapes, i32 per dimension
//! u64 padding length, then that many zero bytes
//! item payloads, back to back
//! ```
//!
//! The padding aligns the first payload to [`ALIGNMENT`] bytes.

use serde_yaml::Mapping;
use std::fs;
use std::path::Path;

use super::error::ModelError;

/// Container format version written and accepted by this build
pub const FORMAT_VERSION: u64 = 1;

/// Name of the item holding the embedded YAML configuration
pub const CONFIG_ITEM: &str = "special:model.yml";

const ALIGNMENT: usize = 256;

/// Element type of an item payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// Raw bytes; also used for embedded text
    Int8,
    Float32,
    Float16,
}

impl ItemType {
    fn tag(self) -> u64 {
        match self {
            ItemType::Int8 => 0x0101,
            ItemType::Float32 => 0x0404,
            ItemType::Float16 => 0x0402,
        }
    }

    fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            0x0101 => Some(ItemType::Int8),
            0x0404 => Some(ItemType::Float32),
            0x0402 => Some(ItemType::Float16),
            _ => None,
        }
    }
}

/// One named item of a model artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactItem {
    pub name: String,
    pub item_type: ItemType,
    pub shape: Vec<i32>,
    pub bytes: Vec<u8>,
}

impl ArtifactItem {
    /// Item carrying UTF-8 text, stored NUL-terminated
    pub fn text(name: &str, text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        Self {
            name: name.to_string(),
            item_type: ItemType::Int8,
            shape: vec![bytes.len() as i32],
            bytes,
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    origin: &'a str,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], ModelError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| ModelError::Corrupt {
                origin: self.origin.to_string(),
                message: format!("truncated while reading {what} at offset {}", self.pos),
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u64(&mut self, what: &str) -> Result<u64, ModelError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn len(&mut self, what: &str) -> Result<usize, ModelError> {
        let value = self.u64(what)?;
        usize::try_from(value).map_err(|_| self.corrupt(format!("{what} {value} out of range")))
    }

    fn i32(&mut self, what: &str) -> Result<i32, ModelError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, what)?);
        Ok(i32::from_le_bytes(buf))
    }

    fn corrupt(&self, message: String) -> ModelError {
        ModelError::Corrupt {
            origin: self.origin.to_string(),
            message,
        }
    }
}

struct ItemHeader {
    name_len: usize,
    item_type: ItemType,
    rank: usize,
    data_len: usize,
}

/// Parse every item of an artifact held in memory
///
/// `origin` names the artifact in error messages.
pub fn read_items(bytes: &[u8], origin: &str) -> Result<Vec<ArtifactItem>, ModelError> {
    let mut cursor = Cursor {
        bytes,
        pos: 0,
        origin,
    };

    let version = cursor.u64("format version")?;
    if version != FORMAT_VERSION {
        return Err(ModelError::UnsupportedVersion {
            origin: origin.to_string(),
            version,
        });
    }

    let count = cursor.len("item count")?;
    // Each header takes 32 bytes; reject counts the buffer cannot hold.
    if count > bytes.len() / 32 {
        return Err(cursor.corrupt(format!("item count {count} exceeds artifact size")));
    }

    let mut headers = Vec::with_capacity(count);
    for _ in 0..count {
        let name_len = cursor.len("name length")?;
        let tag = cursor.u64("type tag")?;
        let item_type = ItemType::from_tag(tag)
            .ok_or_else(|| cursor.corrupt(format!("unknown item type tag {tag:#x}")))?;
        let rank = cursor.len("shape rank")?;
        let data_len = cursor.len("data length")?;
        headers.push(ItemHeader {
            name_len,
            item_type,
            rank,
            data_len,
        });
    }

    let mut names = Vec::with_capacity(count);
    for header in &headers {
        let raw = cursor.take(header.name_len, "item name")?;
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        let name = std::str::from_utf8(raw)
            .map_err(|_| cursor.corrupt("item name is not UTF-8".to_string()))?;
        names.push(name.to_string());
    }

    let mut shapes = Vec::with_capacity(count);
    for header in &headers {
        let mut shape = Vec::with_capacity(header.rank.min(8));
        for _ in 0..header.rank {
            shape.push(cursor.i32("shape dimension")?);
        }
        shapes.push(shape);
    }

    let padding = cursor.len("padding length")?;
    cursor.take(padding, "padding")?;

    let mut items = Vec::with_capacity(count);
    for ((header, name), shape) in headers.iter().zip(names).zip(shapes) {
        let bytes = cursor.take(header.data_len, "item data")?.to_vec();
        items.push(ArtifactItem {
            name,
            item_type: header.item_type,
            shape,
            bytes,
        });
    }
    Ok(items)
}

/// Builds a model artifact
#[derive(Debug, Default, Clone)]
pub struct ArtifactWriter {
    items: Vec<ArtifactItem>,
}

impl ArtifactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; an existing item with the same name is replaced
    pub fn add_item(&mut self, item: ArtifactItem) -> &mut Self {
        self.items.retain(|existing| existing.name != item.name);
        self.items.push(item);
        self
    }

    /// Embed `config` as the artifact's YAML configuration
    pub fn add_config(&mut self, config: &Mapping) -> Result<&mut Self, ModelError> {
        let yaml = serde_yaml::to_string(config).map_err(|source| ModelError::InvalidFragment {
            origin: CONFIG_ITEM.to_string(),
            source,
        })?;
        Ok(self.add_item(ArtifactItem::text(CONFIG_ITEM, &yaml)))
    }

    pub fn items(&self) -> &[ArtifactItem] {
        &self.items
    }

    /// Serialize the container
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.items.len() as u64).to_le_bytes());

        for item in &self.items {
            out.extend_from_slice(&(item.name.len() as u64 + 1).to_le_bytes());
            out.extend_from_slice(&item.item_type.tag().to_le_bytes());
            out.extend_from_slice(&(item.shape.len() as u64).to_le_bytes());
            out.extend_from_slice(&(item.bytes.len() as u64).to_le_bytes());
        }
        for item in &self.items {
            out.extend_from_slice(item.name.as_bytes());
            out.push(0);
        }
        for item in &self.items {
            for dim in &item.shape {
                out.extend_from_slice(&dim.to_le_bytes());
            }
        }

        let padding = (ALIGNMENT - (out.len() + 8) % ALIGNMENT) % ALIGNMENT;
        out.extend_from_slice(&(padding as u64).to_le_bytes());
        out.resize(out.len() + padding, 0);

        for item in &self.items {
            out.extend_from_slice(&item.bytes);
        }
        out
    }

    /// Write the container to `path`
    pub fn write(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(path, self.to_bytes()).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
