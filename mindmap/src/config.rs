//! Layout configuration parsed from environment variables.
//!
//! Every tunable of the engine lives here. `Default` carries the constants
//! from [`crate::consts`]; [`LayoutConfig::from_env`] overlays `MINDMAP_*`
//! variables on top. Unparseable values fall back to the default rather than
//! failing, since a bad knob should never stop a mindmap from opening.

use crate::consts::*;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Font used for measuring block content.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size: f64,
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self { size: DEFAULT_FONT_SIZE, family: DEFAULT_FONT_FAMILY.to_string() }
    }
}

impl FontSpec {
    /// Build a font spec, clamping the size into `[8, 72]` and replacing an
    /// empty family with the default.
    #[must_use]
    pub fn new(size: f64, family: &str) -> Self {
        let size = if size.is_finite() { size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE) } else { DEFAULT_FONT_SIZE };
        let family = if family.trim().is_empty() { DEFAULT_FONT_FAMILY } else { family };
        Self { size, family: family.to_string() }
    }

    /// Height of one wrapped line.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.size * LINE_HEIGHT_FACTOR
    }
}

/// Soft upper / hard lower limits on block dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBounds {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            min_width: MIN_BLOCK_WIDTH,
            min_height: MIN_BLOCK_HEIGHT,
            max_width: MAX_BLOCK_WIDTH,
            max_height: MAX_BLOCK_HEIGHT,
        }
    }
}

/// Paddings and footprints used by the block sizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
    pub bounds: SizeBounds,
    pub text_padding_x: f64,
    pub text_padding_y: f64,
    pub word_padding_x: f64,
    pub measure_prefix_chars: usize,
    pub image_width: f64,
    pub image_height: f64,
    pub image_spacing: f64,
    /// Width/height delta that triggers overlap resolution on update.
    pub significant_resize: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            bounds: SizeBounds::default(),
            text_padding_x: TEXT_PADDING_X,
            text_padding_y: TEXT_PADDING_Y,
            word_padding_x: WORD_PADDING_X,
            measure_prefix_chars: MEASURE_PREFIX_CHARS,
            image_width: IMAGE_WIDTH,
            image_height: IMAGE_HEIGHT,
            image_spacing: IMAGE_SPACING,
            significant_resize: SIGNIFICANT_RESIZE,
        }
    }
}

/// Budget and step policy for the overlap resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    pub max_iterations: usize,
    pub min_iterations: usize,
    pub stability_threshold: f64,
    pub base_step: f64,
    pub reference_dim: f64,
    pub min_step_scale: f64,
    pub min_padding: f64,
    pub max_padding: f64,
    pub padding_fraction: f64,
    pub move_noise: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: RESOLVER_MAX_ITERATIONS,
            min_iterations: RESOLVER_MIN_ITERATIONS,
            stability_threshold: RESOLVER_STABILITY_THRESHOLD,
            base_step: RESOLVER_BASE_STEP,
            reference_dim: RESOLVER_REFERENCE_DIM,
            min_step_scale: RESOLVER_MIN_STEP_SCALE,
            min_padding: RESOLVER_MIN_PADDING,
            max_padding: RESOLVER_MAX_PADDING,
            padding_fraction: RESOLVER_PADDING_FRACTION,
            move_noise: RESOLVER_MOVE_NOISE,
        }
    }
}

/// Zoom-to-fit and recenter policy.
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub margin: f64,
    pub viewport_fraction: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub empty_width: f64,
    pub empty_height: f64,
    /// `(count, cap)` pairs; checked in order, first `n > count` wins.
    pub density_caps: Vec<(usize, f64)>,
    pub recenter_drift: f64,
    pub recenter_nudge: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            margin: FIT_MARGIN,
            viewport_fraction: FIT_VIEWPORT_FRACTION,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            empty_width: EMPTY_BOUNDS_WIDTH,
            empty_height: EMPTY_BOUNDS_HEIGHT,
            density_caps: DENSITY_ZOOM_CAPS.to_vec(),
            recenter_drift: RECENTER_DRIFT_FRACTION,
            recenter_nudge: RECENTER_NUDGE_FACTOR,
        }
    }
}

/// Deferred-work delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayConfig {
    pub fit_ms: u64,
    pub resize_ms: u64,
    pub recenter_ms: u64,
    pub marker_clear_ms: u64,
    pub cascade_step_ms: u64,
    pub notification_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            fit_ms: FIT_DELAY_MS,
            resize_ms: RESIZE_DELAY_MS,
            recenter_ms: RECENTER_DELAY_MS,
            marker_clear_ms: MARKER_CLEAR_MS,
            cascade_step_ms: CASCADE_STEP_MS,
            notification_ms: NOTIFICATION_MS,
        }
    }
}

/// All engine tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub font: FontSpec,
    pub sizing: SizingConfig,
    pub resolver: ResolverConfig,
    pub fit: FitConfig,
    pub delays: DelayConfig,
    pub undo_limit: usize,
    pub duplicate_offset: f64,
    pub grid_padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            sizing: SizingConfig::default(),
            resolver: ResolverConfig::default(),
            fit: FitConfig::default(),
            delays: DelayConfig::default(),
            undo_limit: UNDO_LIMIT,
            duplicate_offset: DUPLICATE_OFFSET,
            grid_padding: GRID_PADDING,
        }
    }
}

impl LayoutConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Recognized:
    /// - `MINDMAP_FONT_SIZE`, `MINDMAP_FONT_FAMILY`
    /// - `MINDMAP_MIN_WIDTH`, `MINDMAP_MIN_HEIGHT`, `MINDMAP_MAX_WIDTH`, `MINDMAP_MAX_HEIGHT`
    /// - `MINDMAP_RESOLVER_MAX_ITERATIONS`, `MINDMAP_RESOLVER_MAX_PADDING`
    /// - `MINDMAP_FIT_MARGIN`, `MINDMAP_FIT_VIEWPORT_FRACTION`
    /// - `MINDMAP_UNDO_LIMIT`
    /// - `MINDMAP_FIT_DELAY_MS`, `MINDMAP_RESIZE_DELAY_MS`
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        let family = match std::env::var("MINDMAP_FONT_FAMILY") {
            Ok(v) => v,
            Err(_) => d.font.family.clone(),
        };
        let font = FontSpec::new(env_parse("MINDMAP_FONT_SIZE", d.font.size), &family);

        let bounds = SizeBounds {
            min_width: env_parse("MINDMAP_MIN_WIDTH", d.sizing.bounds.min_width),
            min_height: env_parse("MINDMAP_MIN_HEIGHT", d.sizing.bounds.min_height),
            max_width: env_parse("MINDMAP_MAX_WIDTH", d.sizing.bounds.max_width),
            max_height: env_parse("MINDMAP_MAX_HEIGHT", d.sizing.bounds.max_height),
        };

        let resolver = ResolverConfig {
            max_iterations: env_parse("MINDMAP_RESOLVER_MAX_ITERATIONS", d.resolver.max_iterations),
            max_padding: env_parse("MINDMAP_RESOLVER_MAX_PADDING", d.resolver.max_padding),
            ..d.resolver
        };

        let fit = FitConfig {
            margin: env_parse("MINDMAP_FIT_MARGIN", d.fit.margin),
            viewport_fraction: env_parse("MINDMAP_FIT_VIEWPORT_FRACTION", d.fit.viewport_fraction)
                .clamp(0.1, 1.0),
            ..d.fit.clone()
        };

        let delays = DelayConfig {
            fit_ms: env_parse("MINDMAP_FIT_DELAY_MS", d.delays.fit_ms),
            resize_ms: env_parse("MINDMAP_RESIZE_DELAY_MS", d.delays.resize_ms),
            ..d.delays
        };

        Self {
            font,
            sizing: SizingConfig { bounds, ..d.sizing },
            resolver,
            fit,
            delays,
            undo_limit: env_parse("MINDMAP_UNDO_LIMIT", d.undo_limit),
            ..d
        }
    }
}

/// Parse an environment variable, returning `default` when unset or invalid.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(v) => v.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
