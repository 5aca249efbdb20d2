//! Grid layout used by organize mode.
//!
//! Cells are sized from the largest block in each dimension plus padding, so
//! no two blocks in the grid can overlap. Blocks fill the grid row by row in
//! reading order (top to bottom, then left to right) and the grid is centered
//! at the world origin.

#[cfg(test)]
#[path = "organize_test.rs"]
mod organize_test;

use std::collections::BTreeMap;

use crate::block::{Block, BlockId};

/// Target position for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: BlockId,
    pub x: f64,
    pub y: f64,
}

/// Positions held while organize mode is active, restored on revert.
///
/// `applied_at` is the `last_edited` stamp the grid layout wrote. A block
/// still carrying it was not touched during organize mode and gets its old
/// stamp back; any other block keeps moving forward in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizeSnapshot {
    entries: BTreeMap<BlockId, SavedPosition>,
    applied_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedPosition {
    x: f64,
    y: f64,
    last_edited: i64,
}

impl OrganizeSnapshot {
    #[must_use]
    pub fn capture(blocks: &[Block], applied_at: i64) -> Self {
        let entries = blocks
            .iter()
            .map(|b| (b.id, SavedPosition { x: b.x, y: b.y, last_edited: b.last_edited }))
            .collect();
        Self { entries, applied_at }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn forget(&mut self, id: &BlockId) {
        self.entries.remove(id);
    }

    /// Put every captured block back where it was. Blocks created after the
    /// capture are left alone. Blocks edited since the capture are stamped
    /// with `now`. Returns how many were restored.
    pub fn restore(&self, blocks: &mut [Block], now: i64) -> usize {
        let mut restored = 0;
        for block in blocks.iter_mut() {
            if let Some(saved) = self.entries.get(&block.id) {
                block.x = saved.x;
                block.y = saved.y;
                block.last_edited = if block.last_edited == self.applied_at { saved.last_edited } else { now };
                restored += 1;
            }
        }
        restored
    }
}

/// Smallest column count whose square covers `n` cells.
#[must_use]
pub fn column_count(n: usize) -> usize {
    let mut cols = 1;
    while cols * cols < n {
        cols += 1;
    }
    cols
}

/// Grid placements for `blocks`, in the input's reading order.
#[must_use]
pub fn grid_layout(blocks: &[Block], padding: f64) -> Vec<Placement> {
    if blocks.is_empty() {
        return Vec::new();
    }
    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let cell_w = blocks.iter().map(|b| b.width).fold(0.0, f64::max) + padding;
    let cell_h = blocks.iter().map(|b| b.height).fold(0.0, f64::max) + padding;
    let cols = column_count(ordered.len());
    let rows = ordered.len().div_ceil(cols);

    let total_w = grid_extent(cols, cell_w, padding);
    let total_h = grid_extent(rows, cell_h, padding);
    let origin_x = -total_w / 2.0;
    let origin_y = -total_h / 2.0;

    ordered
        .iter()
        .enumerate()
        .map(|(i, block)| Placement {
            id: block.id,
            x: origin_x + cell_offset(i % cols, cell_w),
            y: origin_y + cell_offset(i / cols, cell_h),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn cell_offset(index: usize, cell: f64) -> f64 {
    index as f64 * cell
}

/// Span of `count` cells without trailing padding.
fn grid_extent(count: usize, cell: f64, padding: f64) -> f64 {
    cell_offset(count, cell) - padding
}
