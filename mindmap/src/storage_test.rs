use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory per test under the system temp dir.
fn temp_dir(label: &str) -> PathBuf {
    let n = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("mindmap-storage-{label}-{}-{n}", std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    dir
}

// =============================================================
// Keys
// =============================================================

#[test]
fn key_helpers_use_prefix() {
    assert_eq!(blocks_key("abc"), "mindmap-blocks-abc");
    assert_eq!(canvas_key("abc"), "mindmap-canvas-abc");
    assert_eq!(pinned_key("abc"), "mindmap-pinned-abc");
}

#[test]
fn key_validation() {
    assert!(validate_key("mindmap-blocks-1").is_ok());
    assert!(validate_key("a.b_c-d").is_ok());
    assert!(validate_key("").is_err());
    assert!(validate_key("../etc").is_err());
    assert!(validate_key("a/b").is_err());
    assert!(validate_key(".hidden").is_err());
}

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_round_trip() {
    let mut s = MemoryStorage::new();
    assert_eq!(s.get("k").unwrap(), None);
    s.set("k", "v").unwrap();
    assert_eq!(s.get("k").unwrap().as_deref(), Some("v"));
    assert!(s.remove("k").unwrap());
    assert!(!s.remove("k").unwrap());
}

#[test]
fn memory_keys_sorted() {
    let mut s = MemoryStorage::new();
    s.set("b", "1").unwrap();
    s.set("a", "1").unwrap();
    assert_eq!(s.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_round_trip() {
    let dir = temp_dir("round-trip");
    let mut s = FileStorage::open(&dir).unwrap();
    s.set("mindmap-blocks-x", "[]").unwrap();
    assert_eq!(s.get("mindmap-blocks-x").unwrap().as_deref(), Some("[]"));
    assert_eq!(s.keys().unwrap(), vec!["mindmap-blocks-x".to_string()]);

    let reopened = FileStorage::open(&dir).unwrap();
    assert_eq!(reopened.get("mindmap-blocks-x").unwrap().as_deref(), Some("[]"));

    assert!(s.remove("mindmap-blocks-x").unwrap());
    assert_eq!(s.get("mindmap-blocks-x").unwrap(), None);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_rejects_bad_keys() {
    let dir = temp_dir("bad-keys");
    let mut s = FileStorage::open(&dir).unwrap();
    assert!(matches!(s.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(s.get("a/b"), Err(StorageError::InvalidKey(_))));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_keys_ignore_foreign_files() {
    let dir = temp_dir("foreign");
    let mut s = FileStorage::open(&dir).unwrap();
    s.set("mindmap-canvas-x", "{}").unwrap();
    fs::write(dir.join("notes.txt"), "hello").unwrap();
    assert_eq!(s.keys().unwrap(), vec!["mindmap-canvas-x".to_string()]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_get_reports_binary_value_as_not_text() {
    let dir = temp_dir("binary-get");
    let s = FileStorage::open(&dir).unwrap();
    fs::write(dir.join("mindmap-blocks-p.json"), [0xff, 0xfe, 0x00]).unwrap();
    assert!(matches!(s.get("mindmap-blocks-p"), Err(StorageError::NotText(k)) if k == "mindmap-blocks-p"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn binary_file_is_reported_and_cleaned() {
    let dir = temp_dir("binary-health");
    let mut s = FileStorage::open(&dir).unwrap();
    s.set(&canvas_key("p"), "{}").unwrap();
    fs::write(dir.join("mindmap-blocks-p.json"), [0xff, 0xfe, 0x00]).unwrap();

    let report = scan_health(&s).unwrap();
    assert_eq!(report.keys, 2);
    assert_eq!(report.corrupted, vec![blocks_key("p")]);

    assert_eq!(clean_corrupted(&mut s).unwrap(), vec![blocks_key("p")]);
    assert!(!dir.join("mindmap-blocks-p.json").exists());
    assert!(scan_health(&s).unwrap().is_healthy());
    fs::remove_dir_all(&dir).unwrap();
}

// =============================================================
// Health
// =============================================================

fn seeded() -> MemoryStorage {
    let mut s = MemoryStorage::new();
    s.set(&blocks_key("a"), "[]").unwrap();
    s.set(&canvas_key("a"), "{not json").unwrap();
    s.set(&pinned_key("b"), "[]").unwrap();
    s.set("unrelated", "{oops").unwrap();
    s
}

#[test]
fn health_reports_corrupted_engine_keys_only() {
    let report = scan_health(&seeded()).unwrap();
    assert_eq!(report.keys, 3);
    assert_eq!(report.corrupted, vec![canvas_key("a")]);
    assert!(!report.is_healthy());
}

#[test]
fn clean_removes_only_corrupted() {
    let mut s = seeded();
    let removed = clean_corrupted(&mut s).unwrap();
    assert_eq!(removed, vec![canvas_key("a")]);
    assert!(scan_health(&s).unwrap().is_healthy());
    assert!(s.get(&blocks_key("a")).unwrap().is_some());
    assert!(s.get("unrelated").unwrap().is_some());
}

#[test]
fn reset_removes_engine_keys() {
    let mut s = seeded();
    assert_eq!(reset_all(&mut s).unwrap(), 3);
    assert_eq!(s.keys().unwrap(), vec!["unrelated".to_string()]);
}

#[test]
fn mindmap_ids_from_block_keys() {
    let s = seeded();
    assert_eq!(mindmap_ids(&s).unwrap(), vec!["a".to_string()]);
}
