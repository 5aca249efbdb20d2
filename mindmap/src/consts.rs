//! Shared numeric constants for the mindmap crate.
//!
//! These are the defaults behind [`crate::config::LayoutConfig`]; code paths
//! read the config, not these constants, so hosts can override them.

// ── Text ────────────────────────────────────────────────────────

/// Smallest accepted font size.
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Largest accepted font size.
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Font size used when none (or a non-finite one) is supplied.
pub const DEFAULT_FONT_SIZE: f64 = 14.0;

/// Font family used when none is supplied.
pub const DEFAULT_FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.5;

/// Per-column width factor for the character-count width estimate.
pub const APPROX_CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Hard cap on the square-bias target line width.
pub const MAX_LINE_WIDTH: f64 = 400.0;

/// Reported line width never drops below this.
pub const MIN_MEASURED_WIDTH: f64 = 100.0;

/// Preferred width:height ratio when picking a target line width.
pub const SQUARE_BIAS_RATIO: f64 = 2.0;

// ── Block sizing ────────────────────────────────────────────────

pub const MIN_BLOCK_WIDTH: f64 = 120.0;
pub const MIN_BLOCK_HEIGHT: f64 = 60.0;
pub const MAX_BLOCK_WIDTH: f64 = 600.0;
pub const MAX_BLOCK_HEIGHT: f64 = 400.0;

/// Horizontal padding around wrapped text (both sides combined).
pub const TEXT_PADDING_X: f64 = 32.0;

/// Vertical padding around wrapped text (both sides combined).
pub const TEXT_PADDING_Y: f64 = 32.0;

/// Horizontal padding around the single longest word.
pub const WORD_PADDING_X: f64 = 48.0;

/// Content longer than this (in chars) is truncated before measurement.
pub const MEASURE_PREFIX_CHARS: usize = 600;

/// Size of a block with no content and no image.
pub const EMPTY_BLOCK_WIDTH: f64 = 160.0;
pub const EMPTY_BLOCK_HEIGHT: f64 = 80.0;

/// Size used when measurement produced unusable numbers.
pub const FALLBACK_BLOCK_WIDTH: f64 = 250.0;
pub const FALLBACK_BLOCK_HEIGHT: f64 = 120.0;

/// Fixed image footprint inside a block.
pub const IMAGE_WIDTH: f64 = 180.0;
pub const IMAGE_HEIGHT: f64 = 120.0;

/// Gap between the image and the text below it.
pub const IMAGE_SPACING: f64 = 12.0;

/// Above this width:height ratio a block is narrowed.
pub const WIDE_ASPECT_THRESHOLD: f64 = 3.0;

/// Ratio a wide block is narrowed toward.
pub const WIDE_ASPECT_TARGET: f64 = 2.5;

/// Below this width:height ratio a block is shortened.
pub const TALL_ASPECT_THRESHOLD: f64 = 0.5;

/// Ratio a tall block is shortened toward.
pub const TALL_ASPECT_TARGET: f64 = 2.0;

/// Width or height change that counts as a significant resize.
pub const SIGNIFICANT_RESIZE: f64 = 15.0;

// ── Overlap resolution ──────────────────────────────────────────

pub const RESOLVER_MAX_ITERATIONS: usize = 80;
pub const RESOLVER_MIN_ITERATIONS: usize = 3;

/// Total displacement per iteration below which the layout counts as stable.
pub const RESOLVER_STABILITY_THRESHOLD: f64 = 0.5;

/// Step length for a block at or below the reference dimension.
pub const RESOLVER_BASE_STEP: f64 = 24.0;

/// Blocks larger than this take proportionally smaller steps.
pub const RESOLVER_REFERENCE_DIM: f64 = 200.0;

/// Smallest step scale applied to very large blocks.
pub const RESOLVER_MIN_STEP_SCALE: f64 = 0.35;

/// Adaptive padding range between two blocks.
pub const RESOLVER_MIN_PADDING: f64 = 12.0;
pub const RESOLVER_MAX_PADDING: f64 = 30.0;

/// Adaptive padding as a fraction of the smaller block dimension.
pub const RESOLVER_PADDING_FRACTION: f64 = 0.15;

/// Displacement above which a block is reported as moved.
pub const RESOLVER_MOVE_NOISE: f64 = 1.0;

// ── Viewport fitting ────────────────────────────────────────────

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 2.0;

/// Margin added around the content bounding box before fitting.
pub const FIT_MARGIN: f64 = 50.0;

/// Fraction of the viewport the content may occupy.
pub const FIT_VIEWPORT_FRACTION: f64 = 0.85;

/// Bounding box used when there are no blocks (centered at the origin).
pub const EMPTY_BOUNDS_WIDTH: f64 = 800.0;
pub const EMPTY_BOUNDS_HEIGHT: f64 = 600.0;

/// Density caps: `(block count above which the cap applies, max zoom)`.
pub const DENSITY_ZOOM_CAPS: [(usize, f64); 3] = [(50, 0.4), (25, 0.6), (12, 0.8)];

/// Drift (fraction of the viewport) that triggers a gentle recenter.
pub const RECENTER_DRIFT_FRACTION: f64 = 0.25;

/// Fraction of the drift corrected by one gentle recenter.
pub const RECENTER_NUDGE_FACTOR: f64 = 0.3;

// ── Store ───────────────────────────────────────────────────────

pub const UNDO_LIMIT: usize = 10;

/// Offset applied to duplicated blocks, in world units.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Gap between organize-grid cells.
pub const GRID_PADDING: f64 = 40.0;

// ── Deferred work (milliseconds) ────────────────────────────────

pub const FIT_DELAY_MS: u64 = 500;
pub const RESIZE_DELAY_MS: u64 = 300;
pub const RECENTER_DELAY_MS: u64 = 300;
pub const MARKER_CLEAR_MS: u64 = 800;
pub const CASCADE_STEP_MS: u64 = 80;
pub const NOTIFICATION_MS: u64 = 2000;
