#![allow(clippy::float_cmp)]

use super::*;
use crate::overlap::OverlapResolver;

fn block_at(x: f64, y: f64, w: f64, h: f64) -> Block {
    Block::new("", x, y, w, h, 0)
}

fn apply(blocks: &mut [Block], placements: &[Placement]) {
    for p in placements {
        let block = blocks.iter_mut().find(|b| b.id == p.id).unwrap();
        block.x = p.x;
        block.y = p.y;
    }
}

// =============================================================
// Columns
// =============================================================

#[test]
fn column_count_is_ceil_sqrt() {
    assert_eq!(column_count(0), 1);
    assert_eq!(column_count(1), 1);
    assert_eq!(column_count(2), 2);
    assert_eq!(column_count(4), 2);
    assert_eq!(column_count(5), 3);
    assert_eq!(column_count(10), 4);
}

// =============================================================
// Layout
// =============================================================

#[test]
fn empty_input_has_no_placements() {
    assert!(grid_layout(&[], 40.0).is_empty());
}

#[test]
fn layout_follows_reading_order() {
    let blocks = vec![
        block_at(500.0, 0.0, 100.0, 50.0),
        block_at(0.0, 300.0, 100.0, 50.0),
        block_at(0.0, 0.0, 100.0, 50.0),
    ];
    let placements = grid_layout(&blocks, 40.0);
    let order: Vec<BlockId> = placements.iter().map(|p| p.id).collect();
    assert_eq!(order, vec![blocks[2].id, blocks[0].id, blocks[1].id]);
    // Two columns: first two share a row.
    assert_eq!(placements[0].y, placements[1].y);
    assert!(placements[2].y > placements[0].y);
}

#[test]
fn grid_is_centered_at_origin() {
    let blocks: Vec<Block> = (0..4).map(|i| block_at(f64::from(i) * 7.0, 0.0, 100.0, 60.0)).collect();
    let placements = grid_layout(&blocks, 40.0);
    let mut laid = blocks.clone();
    apply(&mut laid, &placements);
    let left = laid.iter().map(|b| b.x).fold(f64::INFINITY, f64::min);
    let right = laid.iter().map(|b| b.x + b.width).fold(f64::NEG_INFINITY, f64::max);
    let top = laid.iter().map(|b| b.y).fold(f64::INFINITY, f64::min);
    let bottom = laid.iter().map(|b| b.y + b.height).fold(f64::NEG_INFINITY, f64::max);
    assert!((left + right).abs() < 1e-9);
    assert!((top + bottom).abs() < 1e-9);
}

#[test]
fn mixed_sizes_never_overlap() {
    let blocks = vec![
        block_at(0.0, 0.0, 600.0, 80.0),
        block_at(0.0, 0.0, 120.0, 400.0),
        block_at(0.0, 0.0, 160.0, 80.0),
        block_at(0.0, 0.0, 300.0, 200.0),
        block_at(0.0, 0.0, 250.0, 120.0),
    ];
    let mut laid = blocks.clone();
    apply(&mut laid, &grid_layout(&blocks, 40.0));
    assert!(OverlapResolver::default().overlapping_pairs(&laid).is_empty());
}

// =============================================================
// Snapshot
// =============================================================

#[test]
fn snapshot_restores_exactly() {
    let mut blocks = vec![block_at(1.25, -3.5, 100.0, 50.0), block_at(77.0, 12.0, 100.0, 50.0)];
    let before = blocks.clone();
    let snapshot = OrganizeSnapshot::capture(&blocks, 99);
    apply(&mut blocks, &grid_layout(&before, 40.0));
    for block in &mut blocks {
        block.last_edited = 99;
    }
    assert_eq!(snapshot.restore(&mut blocks, 200), 2);
    assert_eq!(blocks, before);
}

#[test]
fn snapshot_keeps_later_edits_moving_forward() {
    let mut blocks = vec![block_at(0.0, 0.0, 100.0, 50.0), block_at(300.0, 0.0, 100.0, 50.0)];
    let snapshot = OrganizeSnapshot::capture(&blocks, 99);
    let grid = grid_layout(&blocks, 40.0);
    apply(&mut blocks, &grid);
    blocks[0].last_edited = 99;
    blocks[1].last_edited = 150;

    snapshot.restore(&mut blocks, 200);
    assert_eq!(blocks[0].last_edited, 0);
    assert_eq!(blocks[1].last_edited, 200);
    assert_eq!((blocks[1].x, blocks[1].y), (300.0, 0.0));
}

#[test]
fn snapshot_skips_unknown_blocks() {
    let known = block_at(0.0, 0.0, 100.0, 50.0);
    let mut snapshot = OrganizeSnapshot::capture(std::slice::from_ref(&known), 0);
    let mut blocks = vec![known.clone(), block_at(500.0, 500.0, 100.0, 50.0)];
    blocks[0].x = 10.0;
    assert_eq!(snapshot.restore(&mut blocks, 10), 1);
    assert_eq!(blocks[0].x, 0.0);
    assert_eq!(blocks[1].x, 500.0);

    snapshot.forget(&known.id);
    assert!(snapshot.is_empty());
}
