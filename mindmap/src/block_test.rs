#![allow(clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;

fn make_block(x: f64, y: f64, w: f64, h: f64) -> Block {
    Block {
        id: Uuid::new_v4(),
        content: "note".into(),
        image: None,
        x,
        y,
        width: w,
        height: h,
        mood_tag: MoodTag::Neutral,
        focus_weight: FocusWeight::default(),
        created_at: 1_000,
        last_edited: 1_000,
    }
}

// =============================================================
// MoodTag
// =============================================================

#[test]
fn mood_tag_serde_all_variants() {
    for tag in MoodTag::ALL {
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, format!("\"{}\"", tag.as_str()));
    }
}

#[test]
fn mood_tag_deserialize_invalid_rejects() {
    assert!(serde_json::from_str::<MoodTag>("\"furious\"").is_err());
}

#[test]
fn mood_tag_parse() {
    assert_eq!(MoodTag::parse("idea"), Some(MoodTag::Idea));
    assert_eq!(MoodTag::parse("IDEA"), None);
    assert_eq!(MoodTag::default(), MoodTag::Neutral);
}

// =============================================================
// FocusWeight
// =============================================================

#[test]
fn focus_weight_clamps() {
    assert_eq!(FocusWeight::new(0).get(), 1);
    assert_eq!(FocusWeight::new(3).get(), 3);
    assert_eq!(FocusWeight::new(99).get(), 5);
    assert_eq!(FocusWeight::default().get(), 1);
}

#[test]
fn focus_weight_deserialize_clamps() {
    let w: FocusWeight = serde_json::from_str("9").unwrap();
    assert_eq!(w.get(), 5);
    let w: FocusWeight = serde_json::from_str("-4").unwrap();
    assert_eq!(w.get(), 1);
}

// =============================================================
// Block serde
// =============================================================

#[test]
fn block_deserialize_fills_defaults() {
    let id = Uuid::new_v4();
    let raw = json!({
        "id": id,
        "x": 1.0, "y": 2.0, "width": 150.0, "height": 70.0,
        "created_at": 5, "last_edited": 6
    });
    let block: Block = serde_json::from_value(raw).unwrap();
    assert_eq!(block.id, id);
    assert_eq!(block.content, "");
    assert_eq!(block.image, None);
    assert_eq!(block.mood_tag, MoodTag::Neutral);
    assert_eq!(block.focus_weight.get(), 1);
}

#[test]
fn block_serialize_field_names() {
    let block = make_block(0.0, 0.0, 100.0, 60.0);
    let json = serde_json::to_value(&block).unwrap();
    assert_eq!(json["mood_tag"], "neutral");
    assert_eq!(json["focus_weight"], 1);
    assert_eq!(json["last_edited"], 1_000);
}

// =============================================================
// Block helpers
// =============================================================

#[test]
fn block_new_stamps_both_timestamps() {
    let block = Block::new("hi", 3.0, 4.0, 120.0, 60.0, 42);
    assert_eq!(block.created_at, 42);
    assert_eq!(block.last_edited, 42);
    assert_eq!(block.rect(), crate::camera::Rect::new(3.0, 4.0, 120.0, 60.0));
}

#[test]
fn block_new_ids_are_unique() {
    let a = Block::new("", 0.0, 0.0, 1.0, 1.0, 0);
    let b = Block::new("", 0.0, 0.0, 1.0, 1.0, 0);
    assert_ne!(a.id, b.id);
}

#[test]
fn block_well_formed_rejects_nan_and_zero() {
    assert!(make_block(0.0, 0.0, 10.0, 10.0).is_well_formed());
    assert!(!make_block(f64::NAN, 0.0, 10.0, 10.0).is_well_formed());
    assert!(!make_block(0.0, 0.0, 0.0, 10.0).is_well_formed());
}

// =============================================================
// PartialBlock
// =============================================================

#[test]
fn partial_applies_present_fields_only() {
    let mut block = make_block(0.0, 0.0, 100.0, 60.0);
    let partial = PartialBlock { x: Some(50.0), mood_tag: Some(MoodTag::Idea), ..Default::default() };
    partial.apply_to(&mut block);
    assert_eq!(block.x, 50.0);
    assert_eq!(block.y, 0.0);
    assert_eq!(block.mood_tag, MoodTag::Idea);
    assert_eq!(block.content, "note");
}

#[test]
fn partial_clears_and_sets_image() {
    let mut block = make_block(0.0, 0.0, 100.0, 60.0);
    PartialBlock { image: Some(Some("data:image/png;base64,AA".into())), ..Default::default() }.apply_to(&mut block);
    assert!(block.has_image());
    PartialBlock { image: Some(None), ..Default::default() }.apply_to(&mut block);
    assert!(!block.has_image());
}

#[test]
fn partial_ignores_invalid_geometry() {
    let mut block = make_block(0.0, 0.0, 100.0, 60.0);
    let partial = PartialBlock {
        x: Some(f64::NAN),
        width: Some(-5.0),
        height: Some(f64::INFINITY),
        ..Default::default()
    };
    partial.apply_to(&mut block);
    assert_eq!(block.x, 0.0);
    assert_eq!(block.width, 100.0);
    assert_eq!(block.height, 60.0);
}

#[test]
fn partial_touches_content() {
    assert!(PartialBlock { content: Some(String::new()), ..Default::default() }.touches_content());
    assert!(PartialBlock { image: Some(None), ..Default::default() }.touches_content());
    assert!(!PartialBlock { x: Some(1.0), ..Default::default() }.touches_content());
}

#[test]
fn partial_serialize_skips_absent() {
    let json = serde_json::to_value(PartialBlock { y: Some(2.0), ..Default::default() }).unwrap();
    assert_eq!(json, json!({ "y": 2.0 }));
}
