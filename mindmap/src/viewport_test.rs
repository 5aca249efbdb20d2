#![allow(clippy::float_cmp)]

use super::*;
use crate::block::Block;

fn block_at(x: f64, y: f64, w: f64, h: f64) -> Block {
    Block::new("", x, y, w, h, 0)
}

fn fitter() -> ViewportFitter {
    ViewportFitter::default()
}

fn viewport() -> Viewport {
    Viewport::new(1000.0, 800.0)
}

/// Screen-space rectangle of `rect` under `camera`.
fn on_screen(camera: &Camera, rect: &Rect) -> Rect {
    let tl = camera.world_to_screen(Point::new(rect.x, rect.y));
    Rect::new(tl.x, tl.y, rect.width * camera.zoom, rect.height * camera.zoom)
}

// =============================================================
// content_bounds
// =============================================================

#[test]
fn empty_bounds_are_centered_at_origin() {
    let b = fitter().content_bounds(&[]);
    assert_eq!(b.center(), Point::new(0.0, 0.0));
    assert_eq!(b.width, 800.0);
    assert_eq!(b.height, 600.0);
}

#[test]
fn bounds_include_margin() {
    let blocks = vec![block_at(0.0, 0.0, 100.0, 100.0), block_at(200.0, 100.0, 100.0, 100.0)];
    let b = fitter().content_bounds(&blocks);
    assert_eq!(b, Rect::new(-50.0, -50.0, 400.0, 300.0));
}

#[test]
fn malformed_blocks_are_ignored_in_bounds() {
    let blocks = vec![block_at(0.0, 0.0, 100.0, 100.0), block_at(f64::NAN, 0.0, 100.0, 100.0)];
    let b = fitter().content_bounds(&blocks);
    assert_eq!(b, Rect::new(-50.0, -50.0, 200.0, 200.0));
}

// =============================================================
// fit
// =============================================================

#[test]
fn fit_shows_every_block() {
    let blocks = vec![
        block_at(-900.0, -300.0, 200.0, 100.0),
        block_at(700.0, 500.0, 160.0, 80.0),
        block_at(0.0, 0.0, 300.0, 200.0),
    ];
    let cam = fitter().fit(&blocks, viewport());
    for block in &blocks {
        let s = on_screen(&cam, &block.rect());
        assert!(s.x >= 0.0 && s.right() <= 1000.0, "{s:?}");
        assert!(s.y >= 0.0 && s.bottom() <= 800.0, "{s:?}");
    }
}

#[test]
fn fit_centers_content() {
    let blocks = vec![block_at(100.0, 100.0, 200.0, 100.0)];
    let cam = fitter().fit(&blocks, viewport());
    let center = cam.world_to_screen(Point::new(200.0, 150.0));
    assert!((center.x - 500.0).abs() < 1e-9);
    assert!((center.y - 400.0).abs() < 1e-9);
}

#[test]
fn fit_picks_more_restrictive_axis() {
    // Very wide content: the x axis must decide.
    let blocks = vec![block_at(0.0, 0.0, 3900.0, 100.0)];
    let cam = fitter().fit(&blocks, viewport());
    let expected = 1000.0 * 0.85 / 4000.0;
    assert!((cam.zoom - expected).abs() < 1e-9);
}

#[test]
fn fit_zoom_is_clamped() {
    let tiny = vec![block_at(0.0, 0.0, 1.0, 1.0)];
    assert_eq!(fitter().fit(&tiny, viewport()).zoom, 2.0);
    let vast = vec![block_at(-50_000.0, 0.0, 100.0, 100.0), block_at(50_000.0, 0.0, 100.0, 100.0)];
    assert_eq!(fitter().fit(&vast, viewport()).zoom, 0.2);
}

#[test]
fn fit_is_idempotent() {
    let blocks = vec![block_at(10.0, 20.0, 150.0, 80.0), block_at(400.0, -200.0, 200.0, 120.0)];
    let first = fitter().fit(&blocks, viewport());
    let second = fitter().fit(&blocks, viewport());
    assert_eq!(first, second);
}

#[test]
fn fit_with_unusable_viewport_returns_default() {
    let blocks = vec![block_at(0.0, 0.0, 100.0, 100.0)];
    assert_eq!(fitter().fit(&blocks, Viewport::new(0.0, 0.0)), Camera::default());
}

#[test]
fn fit_without_blocks_uses_default_box() {
    let cam = fitter().fit(&[], viewport());
    let origin = cam.world_to_screen(Point::new(0.0, 0.0));
    assert!((origin.x - 500.0).abs() < 1e-9);
    assert!((origin.y - 400.0).abs() < 1e-9);
    assert!((cam.zoom - (800.0_f64 * 0.85 / 600.0).min(1000.0 * 0.85 / 800.0)).abs() < 1e-9);
}

// =============================================================
// Density caps
// =============================================================

#[test]
fn density_caps_step_down() {
    let f = fitter();
    assert_eq!(f.density_cap(1), 2.0);
    assert_eq!(f.density_cap(12), 2.0);
    assert_eq!(f.density_cap(13), 0.8);
    assert_eq!(f.density_cap(26), 0.6);
    assert_eq!(f.density_cap(51), 0.4);
}

#[test]
fn many_small_blocks_respect_cap() {
    let blocks: Vec<Block> = (0..30).map(|i| block_at(f64::from(i % 6) * 10.0, f64::from(i / 6) * 10.0, 5.0, 5.0)).collect();
    let cam = fitter().fit(&blocks, viewport());
    assert_eq!(cam.zoom, 0.6);
}

// =============================================================
// gentle_recenter
// =============================================================

#[test]
fn recenter_is_noop_while_dragging() {
    let blocks = vec![block_at(5000.0, 5000.0, 100.0, 100.0)];
    assert!(fitter().gentle_recenter(&blocks, Camera::default(), viewport(), true).is_none());
}

#[test]
fn recenter_is_noop_within_threshold() {
    let blocks = vec![block_at(450.0, 350.0, 100.0, 100.0)];
    assert!(fitter().gentle_recenter(&blocks, Camera::default(), viewport(), false).is_none());
}

#[test]
fn recenter_nudges_toward_mass() {
    let blocks = vec![block_at(1950.0, 350.0, 100.0, 100.0)];
    let cam = fitter().gentle_recenter(&blocks, Camera::default(), viewport(), false).unwrap();
    // Mass at screen x=2000, center at 500: drift 1500, nudge 30%.
    assert!((cam.pan_x + 450.0).abs() < 1e-9);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.zoom, 1.0);
}

#[test]
fn recenter_without_blocks_is_noop() {
    assert!(fitter().gentle_recenter(&[], Camera::default(), viewport(), false).is_none());
}

#[test]
fn center_of_mass_averages_centers() {
    let blocks = vec![block_at(0.0, 0.0, 100.0, 100.0), block_at(200.0, 0.0, 100.0, 100.0)];
    assert_eq!(center_of_mass(&blocks), Some(Point::new(150.0, 50.0)));
}
