//! Block sizing: turns content (and an optional image) into block dimensions.
//!
//! Size is a pure function of `(content, image presence, bounds)`. The lower
//! bound is hard and the upper bound is soft: if the text needs more room than
//! `max_width`/`max_height` allow, the text wins, so content is never clipped.

#[cfg(test)]
#[path = "sizer_test.rs"]
mod sizer_test;

use tracing::warn;

use crate::config::{FontSpec, SizeBounds, SizingConfig};
use crate::consts::{
    EMPTY_BLOCK_HEIGHT, EMPTY_BLOCK_WIDTH, FALLBACK_BLOCK_HEIGHT, FALLBACK_BLOCK_WIDTH, TALL_ASPECT_TARGET,
    TALL_ASPECT_THRESHOLD, WIDE_ASPECT_TARGET, WIDE_ASPECT_THRESHOLD,
};
use crate::measure::TextMeasurer;

/// Width and height in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

/// Result of sizing a block: the final size and the footprint the content
/// strictly needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSizing {
    pub size: Size,
    pub required: Size,
}

/// Computes block dimensions from content.
pub struct BlockSizer {
    measurer: TextMeasurer,
    font: FontSpec,
    config: SizingConfig,
}

impl BlockSizer {
    #[must_use]
    pub fn new(measurer: TextMeasurer, font: FontSpec, config: SizingConfig) -> Self {
        Self { measurer, font, config }
    }

    #[must_use]
    pub fn bounds(&self) -> SizeBounds {
        self.config.bounds
    }

    /// Size for `content` within the configured bounds.
    #[must_use]
    pub fn size(&self, content: &str, has_image: bool) -> Size {
        self.size_within(content, has_image, self.config.bounds).size
    }

    /// Size for `content` within explicit bounds.
    ///
    /// Never fails: unusable measurements degrade to a fixed fallback size.
    #[must_use]
    pub fn size_within(&self, content: &str, has_image: bool, bounds: SizeBounds) -> BlockSizing {
        let has_text = !content.trim().is_empty();
        if !has_text && !has_image {
            let size = Size::new(
                soft_clamp(EMPTY_BLOCK_WIDTH, bounds.min_width, bounds.max_width, 0.0),
                soft_clamp(EMPTY_BLOCK_HEIGHT, bounds.min_height, bounds.max_height, 0.0),
            );
            return BlockSizing { size, required: size };
        }

        let required = self.required(content, has_text, has_image);
        if !required.is_finite() {
            warn!(chars = content.chars().count(), "block measurement produced non-finite size; using fallback");
            let size = Size::new(FALLBACK_BLOCK_WIDTH, FALLBACK_BLOCK_HEIGHT);
            return BlockSizing { size, required: size };
        }

        let mut width = required.width.max(bounds.min_width);
        let mut height = required.height.max(bounds.min_height);

        // Aspect correction only when the content fits comfortably; both
        // branches are floored at the required footprint.
        if required.width <= bounds.max_width && required.height <= bounds.max_height && height > 0.0 {
            let aspect = width / height;
            if aspect > WIDE_ASPECT_THRESHOLD {
                width = (height * WIDE_ASPECT_TARGET).max(required.width);
            } else if aspect < TALL_ASPECT_THRESHOLD {
                height = (width / TALL_ASPECT_TARGET).max(required.height);
            }
        }

        let size = Size::new(
            soft_clamp(width, bounds.min_width, bounds.max_width, required.width),
            soft_clamp(height, bounds.min_height, bounds.max_height, required.height),
        );
        BlockSizing { size, required }
    }

    fn required(&self, content: &str, has_text: bool, has_image: bool) -> Size {
        let cfg = &self.config;
        let (mut width, mut height) = if has_text {
            let sample = truncate_chars(content, cfg.measure_prefix_chars);
            let m = self.measurer.measure(sample, &self.font);
            let width = (m.max_line_width + cfg.text_padding_x).max(m.longest_word_width + cfg.word_padding_x);
            (width, m.total_height() + cfg.text_padding_y)
        } else {
            (0.0, cfg.text_padding_y)
        };

        if has_image {
            width = width.max(cfg.image_width + cfg.text_padding_x);
            height += cfg.image_height + if has_text { cfg.image_spacing } else { 0.0 };
        }
        Size::new(width, height)
    }
}

/// Clamp into `[min, max]` without panicking on inverted bounds, then raise
/// to `floor`. The floor always wins.
fn soft_clamp(value: f64, min: f64, max: f64, floor: f64) -> f64 {
    value.min(max).max(min).max(floor)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
