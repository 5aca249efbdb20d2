//! Block model: the text cards that live on a mindmap canvas.
//!
//! This module defines the data types persisted for every block (`Block`,
//! `MoodTag`, `FocusWeight`) and the sparse-update type used for incremental
//! edits (`PartialBlock`). Sizing, overlap resolution and persistence all live
//! elsewhere; a `Block` here is plain data.

#[cfg(test)]
#[path = "block_test.rs"]
mod block_test;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::camera::Rect;

/// Unique identifier for a block. Generated at creation, never changes.
pub type BlockId = Uuid;

/// Emotional / semantic tag attached to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTag {
    #[default]
    Neutral,
    Positive,
    Negative,
    Idea,
    Important,
    Question,
}

impl MoodTag {
    pub const ALL: [MoodTag; 6] = [
        MoodTag::Neutral,
        MoodTag::Positive,
        MoodTag::Negative,
        MoodTag::Idea,
        MoodTag::Important,
        MoodTag::Question,
    ];

    /// Lowercase name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Idea => "idea",
            Self::Important => "important",
            Self::Question => "question",
        }
    }

    /// Parse the lowercase name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == raw)
    }
}

/// Focus weight in `1..=5`. Out-of-range values are clamped, including on
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FocusWeight(u8);

impl FocusWeight {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    #[must_use]
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let weight = clamped as u8;
        Self(weight)
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for FocusWeight {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl<'de> Deserialize<'de> for FocusWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

/// A block as stored in memory and in persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique identifier.
    pub id: BlockId,
    /// Text content; may be empty. Never truncated.
    #[serde(default)]
    pub content: String,
    /// Opaque image payload reference (data URL, path, ...).
    #[serde(default)]
    pub image: Option<String>,
    /// Left edge in world coordinates.
    pub x: f64,
    /// Top edge in world coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub mood_tag: MoodTag,
    #[serde(default)]
    pub focus_weight: FocusWeight,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last mutation time, epoch milliseconds.
    pub last_edited: i64,
}

impl Block {
    /// Create a block with a fresh id at the given world position.
    #[must_use]
    pub fn new(content: &str, x: f64, y: f64, width: f64, height: f64, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.to_string(),
            image: None,
            x,
            y,
            width,
            height,
            mood_tag: MoodTag::default(),
            focus_weight: FocusWeight::default(),
            created_at: now,
            last_edited: now,
        }
    }

    /// Bounding box in world space.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Whether every geometric field is a finite number with positive size.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Sparse update for a block. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `Some(None)` clears the image, `Some(Some(..))` replaces it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_tag: Option<MoodTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_weight: Option<FocusWeight>,
}

impl PartialBlock {
    /// Whether applying this update changes text or image, which drives a resize.
    #[must_use]
    pub fn touches_content(&self) -> bool {
        self.content.is_some() || self.image.is_some()
    }

    /// Merge present fields into `block`. Does not stamp `last_edited`.
    pub fn apply_to(&self, block: &mut Block) {
        if let Some(ref content) = self.content {
            block.content.clone_from(content);
        }
        if let Some(ref image) = self.image {
            block.image.clone_from(image);
        }
        if let Some(x) = self.x.filter(|v| v.is_finite()) {
            block.x = x;
        }
        if let Some(y) = self.y.filter(|v| v.is_finite()) {
            block.y = y;
        }
        if let Some(w) = self.width.filter(|v| v.is_finite() && *v > 0.0) {
            block.width = w;
        }
        if let Some(h) = self.height.filter(|v| v.is_finite() && *v > 0.0) {
            block.height = h;
        }
        if let Some(tag) = self.mood_tag {
            block.mood_tag = tag;
        }
        if let Some(weight) = self.focus_weight {
            block.focus_weight = weight;
        }
    }
}
