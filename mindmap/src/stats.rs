//! Aggregate figures over a set of blocks.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::block::{Block, BlockId, MoodTag};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MindmapStats {
    pub blocks: usize,
    pub pinned: usize,
    /// Count per mood tag, in [`MoodTag::ALL`] order.
    pub moods: Vec<(MoodTag, usize)>,
    /// Mean focus weight, or 0 with no blocks.
    pub mean_focus: f64,
    /// Total characters of content.
    pub characters: usize,
    pub with_images: usize,
}

impl MindmapStats {
    #[must_use]
    pub fn collect<'a>(blocks: impl IntoIterator<Item = &'a Block>, pinned: &BTreeSet<BlockId>) -> Self {
        let mut stats = Self {
            blocks: 0,
            pinned: 0,
            moods: MoodTag::ALL.iter().map(|tag| (*tag, 0)).collect(),
            mean_focus: 0.0,
            characters: 0,
            with_images: 0,
        };
        let mut focus_total = 0_u64;
        for block in blocks {
            stats.blocks += 1;
            if pinned.contains(&block.id) {
                stats.pinned += 1;
            }
            if let Some(slot) = stats.moods.iter_mut().find(|(tag, _)| *tag == block.mood_tag) {
                slot.1 += 1;
            }
            focus_total += u64::from(block.focus_weight.get());
            stats.characters += block.content.chars().count();
            if block.has_image() {
                stats.with_images += 1;
            }
        }
        if stats.blocks > 0 {
            #[allow(clippy::cast_precision_loss)]
            let mean = focus_total as f64 / stats.blocks as f64;
            stats.mean_focus = mean;
        }
        stats
    }

    #[must_use]
    pub fn mood_count(&self, tag: MoodTag) -> usize {
        self.moods.iter().find(|(t, _)| *t == tag).map_or(0, |(_, n)| *n)
    }
}
