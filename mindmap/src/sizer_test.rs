#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::*;
use crate::measure::TextMeasurer;

fn sizer() -> BlockSizer {
    BlockSizer::new(TextMeasurer::default(), FontSpec::default(), SizingConfig::default())
}

fn bounds(min_w: f64, min_h: f64, max_w: f64, max_h: f64) -> SizeBounds {
    SizeBounds { min_width: min_w, min_height: min_h, max_width: max_w, max_height: max_h }
}

// =============================================================
// Degenerate content
// =============================================================

#[test]
fn empty_content_gets_default_size() {
    let s = sizer().size("", false);
    assert_eq!(s, Size::new(EMPTY_BLOCK_WIDTH, EMPTY_BLOCK_HEIGHT));
}

#[test]
fn whitespace_content_gets_default_size() {
    assert_eq!(sizer().size("  \n\t ", false), sizer().size("", false));
}

#[test]
fn default_size_respects_bounds() {
    let s = sizer().size_within("", false, bounds(300.0, 200.0, 600.0, 400.0)).size;
    assert_eq!(s, Size::new(300.0, 200.0));
}

// =============================================================
// Text sizing
// =============================================================

#[test]
fn hello_world_fits_on_one_line() {
    let s = sizer().size("Hello world", false);
    assert!(s.width >= 120.0, "width {}", s.width);
    assert!(s.height >= 50.0, "height {}", s.height);
    assert!(s.width <= MAX_BLOCK_WIDTH);
    assert!(s.height <= MAX_BLOCK_HEIGHT);
}

#[test]
fn longer_text_is_not_smaller() {
    let short = sizer().size("a few words", false);
    let long = sizer().size(&"a few words ".repeat(30), false);
    assert!(long.width >= short.width);
    assert!(long.height > short.height);
}

#[test]
fn size_never_clips_text() {
    let sizer = sizer();
    let samples = [
        "x",
        "Hello world",
        "supercalifragilisticexpialidocious",
        "line one\nline two\n\nline four",
        "many many many many many many many many many many many many many many many words",
        "日本語のテキストも測定できる",
    ];
    let configs = [
        bounds(120.0, 60.0, 600.0, 400.0),
        bounds(50.0, 20.0, 100.0, 40.0),
        bounds(400.0, 300.0, 500.0, 350.0),
    ];
    for text in samples {
        for b in configs {
            let sizing = sizer.size_within(text, false, b);
            assert!(sizing.size.width >= sizing.required.width, "{text:?} {b:?}");
            assert!(sizing.size.height >= sizing.required.height, "{text:?} {b:?}");
            assert!(sizing.size.width >= b.min_width);
            assert!(sizing.size.height >= b.min_height);
        }
    }
}

#[test]
fn required_width_covers_longest_word() {
    let word = "pneumonoultramicroscopicsilicovolcanoconiosis";
    let sizing = sizer().size_within(word, false, SizeBounds::default());
    let word_width = crate::measure::ApproxMetrics::width(word, &FontSpec::default());
    assert!(sizing.size.width >= word_width + WORD_PADDING_X);
}

#[test]
fn required_size_beats_max_bounds() {
    let word = "x".repeat(60);
    let tight = bounds(50.0, 20.0, 100.0, 40.0);
    let sizing = sizer().size_within(&word, false, tight);
    assert!(sizing.size.width > tight.max_width);
    assert_eq!(sizing.size.width, sizing.required.width);
}

#[test]
fn wide_min_bounds_are_kept() {
    let wide = bounds(500.0, 60.0, 800.0, 400.0);
    let sizing = sizer().size_within("hi", false, wide);
    assert_eq!(sizing.size.width, 500.0);
}

#[test]
fn inverted_bounds_do_not_panic() {
    let inverted = bounds(500.0, 300.0, 100.0, 50.0);
    let sizing = sizer().size_within("text", false, inverted);
    assert!(sizing.size.width.is_finite());
    assert!(sizing.size.height >= sizing.required.height);
}

#[test]
fn measurement_uses_bounded_prefix() {
    let base = "word ".repeat(120);
    let huge = format!("{base}{}", "tail ".repeat(2000));
    let prefix: String = huge.chars().take(MEASURE_PREFIX_CHARS).collect();
    assert_eq!(sizer().size(&huge, false), sizer().size(&prefix, false));
}

#[test]
fn truncate_chars_respects_char_boundaries() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("abc", 10), "abc");
}

// =============================================================
// Images
// =============================================================

#[test]
fn image_only_block_fits_image() {
    let s = sizer().size("", true);
    assert!(s.width >= IMAGE_WIDTH + TEXT_PADDING_X);
    assert!(s.height >= IMAGE_HEIGHT + TEXT_PADDING_Y);
}

#[test]
fn image_adds_height_to_text() {
    let text_only = sizer().size("caption text", false);
    let with_image = sizer().size("caption text", true);
    assert!(with_image.height >= text_only.height + IMAGE_HEIGHT);
    assert!(with_image.width >= IMAGE_WIDTH);
}

// =============================================================
// Fallback
// =============================================================

#[test]
fn non_finite_measurement_uses_fallback() {
    let config = SizingConfig { text_padding_y: f64::NAN, ..SizingConfig::default() };
    let sizer = BlockSizer::new(TextMeasurer::default(), FontSpec::default(), config);
    assert_eq!(sizer.size("anything", false), Size::new(FALLBACK_BLOCK_WIDTH, FALLBACK_BLOCK_HEIGHT));
}
