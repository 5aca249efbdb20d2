//! Overlap resolution by iterative relaxation.
//!
//! DESIGN
//! ======
//! One block (the subject) is immovable. Every other block that overlaps the
//! subject, or another block, is pushed along the sum of unit repulsion
//! vectors from everything it touches. Steps are bounded and shrink for large
//! blocks so big cards drift while small ones hop. Blocks are updated in place
//! within an iteration (Gauss-Seidel), which keeps runs deterministic for a
//! given input order.
//!
//! TERMINATION
//! ===========
//! The loop stops once an iteration moves less than the stability threshold
//! (after a minimum number of iterations) or when the iteration cap is hit.
//! Relaxation is not guaranteed to converge for dense clusters; callers must
//! tolerate residual overlap after the cap. That is reported, not an error.
//!
//! Coincident centers are separated along an angle derived from a SHA-256 of
//! the two ids, so identical inputs always produce identical layouts.

#[cfg(test)]
#[path = "overlap_test.rs"]
mod overlap_test;

use std::f64::consts::TAU;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::block::{Block, BlockId};
use crate::camera::Rect;
use crate::config::ResolverConfig;

const DIRECTION_EPSILON: f64 = 1e-9;

/// A block displaced by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovedBlock {
    pub id: BlockId,
    pub dx: f64,
    pub dy: f64,
    /// Distance from the subject's center to the block's final center.
    pub distance: f64,
}

/// Output of [`OverlapResolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Same ids, same order as the input, with adjusted positions.
    pub blocks: Vec<Block>,
    /// Blocks displaced beyond the noise threshold, nearest to the subject first.
    pub moved: Vec<MovedBlock>,
    pub iterations: usize,
    /// Whether the iteration cap ended the run.
    pub capped: bool,
    /// Overlapping pairs left after the run (subject included).
    pub residual_overlaps: usize,
}

/// Pushes blocks apart around an immovable subject.
#[derive(Debug, Clone, Default)]
pub struct OverlapResolver {
    config: ResolverConfig,
}

impl OverlapResolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Required gap between two blocks, derived from the smaller dimension of
    /// the pair and kept within `[min_padding, max_padding]`.
    #[must_use]
    pub fn padding_between(&self, a: &Rect, b: &Rect) -> f64 {
        let smaller = a.width.min(a.height).min(b.width).min(b.height);
        (smaller * self.config.padding_fraction)
            .max(self.config.min_padding)
            .min(self.config.max_padding)
    }

    /// Whether two blocks are closer than their adaptive padding.
    #[must_use]
    pub fn overlaps(&self, a: &Rect, b: &Rect) -> bool {
        a.intersects_padded(b, self.padding_between(a, b))
    }

    /// All overlapping id pairs in `blocks`.
    #[must_use]
    pub fn overlapping_pairs(&self, blocks: &[Block]) -> Vec<(BlockId, BlockId)> {
        let mut pairs = Vec::new();
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                if self.overlaps(&a.rect(), &b.rect()) {
                    pairs.push((a.id, b.id));
                }
            }
        }
        pairs
    }

    /// Displace `others` until none overlaps the subject or each other, or
    /// until the iteration budget runs out. `others` is not modified; an
    /// entry sharing the subject's id is passed through untouched.
    #[must_use]
    pub fn resolve(&self, subject: &Block, others: &[Block]) -> Resolution {
        let cfg = &self.config;
        let subject_rect = subject.rect();
        let mut work: Vec<Block> = others.to_vec();

        // A minimum above the cap would make every run look capped.
        let min_iterations = cfg.min_iterations.min(cfg.max_iterations);
        let mut iterations = 0;
        let mut stable = false;
        while iterations < cfg.max_iterations {
            iterations += 1;
            let mut total = 0.0;

            for i in 0..work.len() {
                if work[i].id == subject.id {
                    continue;
                }
                let rect = work[i].rect();
                let mut vx = 0.0;
                let mut vy = 0.0;
                let mut hits = 0_usize;

                if self.overlaps(&rect, &subject_rect) {
                    let (ux, uy) = repulsion(&subject_rect, &rect, &subject.id, &work[i].id);
                    vx += ux;
                    vy += uy;
                    hits += 1;
                }
                for (j, other) in work.iter().enumerate() {
                    if j == i || other.id == subject.id {
                        continue;
                    }
                    let other_rect = other.rect();
                    if self.overlaps(&rect, &other_rect) {
                        let (ux, uy) = repulsion(&other_rect, &rect, &other.id, &work[i].id);
                        vx += ux;
                        vy += uy;
                        hits += 1;
                    }
                }
                if hits == 0 {
                    continue;
                }

                let len = vx.hypot(vy);
                let (ux, uy) = if len < DIRECTION_EPSILON {
                    // Opposing pushes cancelled out; pick a stable escape angle.
                    hashed_direction(&subject.id, &work[i].id)
                } else {
                    (vx / len, vy / len)
                };
                let step = self.step_for(&rect);
                work[i].x += ux * step;
                work[i].y += uy * step;
                total += step;
            }

            if iterations >= min_iterations && total < cfg.stability_threshold {
                stable = true;
                break;
            }
        }

        let moved = self.collect_moved(subject, others, &work);
        let residual_overlaps = self.count_residual(subject, &work);
        let capped = !stable;
        if capped {
            warn!(iterations, residual_overlaps, blocks = work.len(), "overlap resolution hit iteration cap");
        } else {
            debug!(iterations, moved = moved.len(), "overlap resolution settled");
        }

        Resolution { blocks: work, moved, iterations, capped, residual_overlaps }
    }

    /// Step length for a block: full `base_step` up to the reference
    /// dimension, proportionally smaller beyond it.
    fn step_for(&self, rect: &Rect) -> f64 {
        let cfg = &self.config;
        let largest = rect.width.max(rect.height).max(1.0);
        let scale = (cfg.reference_dim / largest).min(1.0).max(cfg.min_step_scale);
        cfg.base_step * scale
    }

    fn collect_moved(&self, subject: &Block, before: &[Block], after: &[Block]) -> Vec<MovedBlock> {
        let origin = subject.rect().center();
        let mut moved: Vec<MovedBlock> = before
            .iter()
            .zip(after)
            .filter_map(|(old, new)| {
                let dx = new.x - old.x;
                let dy = new.y - old.y;
                if dx.hypot(dy) <= self.config.move_noise {
                    return None;
                }
                let center = new.rect().center();
                let distance = (center.x - origin.x).hypot(center.y - origin.y);
                Some(MovedBlock { id: new.id, dx, dy, distance })
            })
            .collect();
        moved.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        moved
    }

    fn count_residual(&self, subject: &Block, work: &[Block]) -> usize {
        let subject_rect = subject.rect();
        let against_subject = work
            .iter()
            .filter(|b| b.id != subject.id && self.overlaps(&b.rect(), &subject_rect))
            .count();
        let movable: Vec<Block> = work.iter().filter(|b| b.id != subject.id).cloned().collect();
        against_subject + self.overlapping_pairs(&movable).len()
    }
}

/// Unit vector pushing `target` away from `source`.
fn repulsion(source: &Rect, target: &Rect, source_id: &BlockId, target_id: &BlockId) -> (f64, f64) {
    let from = source.center();
    let to = target.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dist = dx.hypot(dy);
    if dist < DIRECTION_EPSILON {
        return hashed_direction(source_id, target_id);
    }
    (dx / dist, dy / dist)
}

/// Deterministic direction for pushing `target` away from `source`.
///
/// The angle depends only on the unordered pair; the sign flips with order,
/// so two coincident blocks are pushed in opposite directions.
fn hashed_direction(source: &BlockId, target: &BlockId) -> (f64, f64) {
    let (lo, hi, sign) = if source <= target { (source, target, 1.0) } else { (target, source, -1.0) };
    let mut hasher = Sha256::new();
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0_u8; 8];
    head.copy_from_slice(&digest[..8]);
    #[allow(clippy::cast_precision_loss)]
    let angle = (u64::from_le_bytes(head) as f64 / u64::MAX as f64) * TAU;
    (angle.cos() * sign, angle.sin() * sign)
}
