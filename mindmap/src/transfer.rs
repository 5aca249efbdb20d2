//! Import and export of a whole mindmap as a JSON document.
//!
//! Export format:
//!
//! ```json
//! { "blocks": [...], "canvas": { "pan_x": 0, "pan_y": 0, "zoom": 1 },
//!   "timestamp": 1700000000000, "version": "1.0" }
//! ```
//!
//! Import is two-phase. [`parse_import`] validates a document and returns an
//! [`ImportPlan`] without touching any state; the store applies the plan only
//! once the host has confirmed the replace.

#[cfg(test)]
#[path = "transfer_test.rs"]
mod transfer_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::Block;
use crate::camera::Camera;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("import document must be a json object")]
    NotObject,
    #[error("import document has no `blocks` array")]
    BlocksNotArray,
    #[error("block entry {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Serialized snapshot of a mindmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub blocks: Vec<Block>,
    pub canvas: Camera,
    /// Export time, epoch milliseconds.
    pub timestamp: i64,
    pub version: String,
}

impl ExportDocument {
    #[must_use]
    pub fn new(blocks: Vec<Block>, canvas: Camera, timestamp: i64) -> Self {
        Self { blocks, canvas, timestamp, version: EXPORT_VERSION.to_string() }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// How an import replaces the current block set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Re-create each block from its world position and content. Ids, sizes,
    /// tags and timestamps are not kept; sizes are recomputed and overlaps
    /// resolved as if the user had created them one by one.
    #[default]
    Replay,
    /// Keep every field of entries that carry a complete block. Incomplete
    /// entries fall back to replay.
    Full,
}

/// One validated block entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportEntry {
    pub x: f64,
    pub y: f64,
    pub content: String,
    /// Present when the entry deserializes as a complete, well-formed block.
    pub block: Option<Block>,
}

/// Validated import, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    pub entries: Vec<ImportEntry>,
    pub canvas: Option<Camera>,
    pub version: Option<String>,
}

impl ImportPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate an import document.
///
/// # Errors
///
/// Returns an [`ImportError`] if the text is not JSON, is not an object, has
/// no `blocks` array, or any entry lacks a finite `x`/`y`.
pub fn parse_import(text: &str) -> Result<ImportPlan, ImportError> {
    let doc: Value = serde_json::from_str(text)?;
    let Value::Object(map) = doc else {
        return Err(ImportError::NotObject);
    };
    let Some(Value::Array(raw_blocks)) = map.get("blocks") else {
        return Err(ImportError::BlocksNotArray);
    };

    let mut entries = Vec::with_capacity(raw_blocks.len());
    for (index, raw) in raw_blocks.iter().enumerate() {
        entries.push(parse_entry(index, raw)?);
    }

    let canvas = match map.get("canvas") {
        Some(raw) => match serde_json::from_value::<Camera>(raw.clone()) {
            Ok(camera) => Some(camera.sanitized()),
            Err(_) => None,
        },
        None => None,
    };
    let version = map.get("version").and_then(Value::as_str).map(str::to_string);

    Ok(ImportPlan { entries, canvas, version })
}

fn parse_entry(index: usize, raw: &Value) -> Result<ImportEntry, ImportError> {
    let invalid = |reason: &str| ImportError::InvalidEntry { index, reason: reason.to_string() };
    let Value::Object(fields) = raw else {
        return Err(invalid("not an object"));
    };
    let coord = |name: &str| fields.get(name).and_then(Value::as_f64).filter(|v| v.is_finite());
    let x = coord("x").ok_or_else(|| invalid("missing or non-finite x"))?;
    let y = coord("y").ok_or_else(|| invalid("missing or non-finite y"))?;
    let content = match fields.get("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(invalid("content is not a string")),
    };
    let block = match serde_json::from_value::<Block>(raw.clone()) {
        Ok(block) if block.is_well_formed() => Some(block),
        _ => None,
    };
    Ok(ImportEntry { x, y, content, block })
}
