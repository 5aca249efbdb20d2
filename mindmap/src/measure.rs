//! Text measurement and word wrapping for block content.
//!
//! [`TextMeasurer`] wraps text into lines that bias the resulting block toward
//! a roughly square shape. Widths come from a pluggable [`TextMetrics`]
//! backend; when the backend cannot measure (no font data, headless host) the
//! measurer falls back to [`ApproxMetrics`], a deterministic character-count
//! estimate. Measurement never fails from the caller's point of view.

#[cfg(test)]
#[path = "measure_test.rs"]
mod measure_test;

use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::config::FontSpec;
use crate::consts::{APPROX_CHAR_WIDTH_FACTOR, MAX_LINE_WIDTH, MIN_MEASURED_WIDTH, SQUARE_BIAS_RATIO};

/// Error reported by a metrics backend that cannot measure.
#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    #[error("text metrics unavailable: {0}")]
    Unavailable(String),
    #[error("text metrics returned invalid width {0}")]
    InvalidWidth(f64),
}

/// A source of rendered text widths.
pub trait TextMetrics {
    /// Rendered width of a single line of `text` in `font`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot measure in this environment.
    fn text_width(&self, text: &str, font: &FontSpec) -> Result<f64, MeasureError>;
}

/// Deterministic width estimate: `font.size * 0.6` per display column.
///
/// Wide (CJK, emoji) characters count as two columns. Monotonic in the text:
/// appending characters never decreases the width.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMetrics;

impl ApproxMetrics {
    #[must_use]
    pub fn width(text: &str, font: &FontSpec) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let columns = UnicodeWidthStr::width(text) as f64;
        columns * font.size * APPROX_CHAR_WIDTH_FACTOR
    }
}

impl TextMetrics for ApproxMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> Result<f64, MeasureError> {
        Ok(Self::width(text, font))
    }
}

/// Wrapped text and its extents.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub lines: Vec<String>,
    /// Widest rendered line, never below 100 for non-empty text.
    pub max_line_width: f64,
    /// Widest single whitespace-delimited word.
    pub longest_word_width: f64,
    pub line_height: f64,
    /// Whether any width came from the approximate fallback.
    pub approximated: bool,
}

impl Measurement {
    fn empty(font: &FontSpec) -> Self {
        Self {
            lines: Vec::new(),
            max_line_width: 0.0,
            longest_word_width: 0.0,
            line_height: font.line_height(),
            approximated: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Height of all wrapped lines stacked.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let count = self.lines.len() as f64;
        count * self.line_height
    }
}

/// Wraps text using a metrics backend, falling back to [`ApproxMetrics`].
pub struct TextMeasurer {
    backend: Box<dyn TextMetrics>,
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::new(Box::new(ApproxMetrics))
    }
}

impl TextMeasurer {
    #[must_use]
    pub fn new(backend: Box<dyn TextMetrics>) -> Self {
        Self { backend }
    }

    /// Wrap `text` into lines and report the widest one.
    ///
    /// Newlines are hard paragraph breaks; an empty paragraph yields one empty
    /// line. Words are never split, so a long unbreakable word widens the
    /// target line width instead.
    #[must_use]
    pub fn measure(&self, text: &str, font: &FontSpec) -> Measurement {
        if text.is_empty() {
            return Measurement::empty(font);
        }

        let mut approximated = false;
        let mut width = |s: &str| self.width_or_estimate(s, font, &mut approximated);

        let longest_word_width = text.split_whitespace().map(&mut width).fold(0.0, f64::max);
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let full_width = width(&flat);
        let target = target_line_width(full_width, longest_word_width, font.line_height());

        let mut lines = Vec::new();
        let mut max_line_width: f64 = 0.0;
        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_width = 0.0;
            for word in paragraph.split_whitespace() {
                if current.is_empty() {
                    current.push_str(word);
                    current_width = width(&current);
                    continue;
                }
                let candidate = format!("{current} {word}");
                let candidate_width = width(&candidate);
                if candidate_width <= target {
                    current = candidate;
                    current_width = candidate_width;
                } else {
                    max_line_width = max_line_width.max(current_width);
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = width(&current);
                }
            }
            max_line_width = max_line_width.max(current_width);
            lines.push(current);
        }

        Measurement {
            lines,
            max_line_width: max_line_width.max(MIN_MEASURED_WIDTH),
            longest_word_width,
            line_height: font.line_height(),
            approximated,
        }
    }

    fn width_or_estimate(&self, text: &str, font: &FontSpec, approximated: &mut bool) -> f64 {
        let measured = self.backend.text_width(text, font).and_then(|w| {
            if w.is_finite() && w >= 0.0 { Ok(w) } else { Err(MeasureError::InvalidWidth(w)) }
        });
        match measured {
            Ok(w) => w,
            Err(e) => {
                if !*approximated {
                    debug!(error = %e, "text metrics failed; using character estimate");
                }
                *approximated = true;
                ApproxMetrics::width(text, font)
            }
        }
    }
}

/// Pick the line width that makes the wrapped block roughly square.
///
/// For text of total width `W` and line height `h`, `n` lines give a block of
/// `W / n` by `n * h`; solving for a `SQUARE_BIAS_RATIO : 1` shape gives
/// `sqrt(W * h * ratio)`. Capped at 400 unless a single word needs more.
fn target_line_width(full_width: f64, longest_word: f64, line_height: f64) -> f64 {
    let square = (full_width * line_height * SQUARE_BIAS_RATIO).sqrt();
    let mut target = square.clamp(MIN_MEASURED_WIDTH, MAX_LINE_WIDTH);
    if full_width <= target {
        target = full_width;
    }
    target.max(longest_word)
}
