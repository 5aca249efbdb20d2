//! Durable key-value storage for mindmap state.
//!
//! Each mindmap owns three keys: its block list, its camera, and its pinned
//! id set. Values are JSON text. Reads of corrupt values are the caller's
//! concern; this layer only moves strings.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Prefix shared by every key this engine writes.
pub const KEY_PREFIX: &str = "mindmap-";

const FILE_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    /// The stored bytes are not UTF-8 text.
    #[error("storage value for {0:?} is not valid UTF-8")]
    NotText(String),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String key-value store.
pub trait Storage {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<bool, StorageError>;

    /// All keys, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[must_use]
pub fn blocks_key(mindmap_id: &str) -> String {
    format!("{KEY_PREFIX}blocks-{mindmap_id}")
}

#[must_use]
pub fn canvas_key(mindmap_id: &str) -> String {
    format!("{KEY_PREFIX}canvas-{mindmap_id}")
}

#[must_use]
pub fn pinned_key(mindmap_id: &str) -> String {
    format!("{KEY_PREFIX}pinned-{mindmap_id}")
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-process storage. State is lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// =============================================================================
// FILES
// =============================================================================

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened file storage");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| StorageError::NotText(key.to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves a half-written value.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|e| e != FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid { Ok(()) } else { Err(StorageError::InvalidKey(key.to_string())) }
}

// =============================================================================
// HEALTH
// =============================================================================

/// Summary of the engine's keys in a storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// Number of engine keys.
    pub keys: usize,
    /// Total size of engine values in bytes.
    pub bytes: usize,
    /// Keys whose value is not valid JSON text.
    pub corrupted: Vec<String>,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.corrupted.is_empty()
    }
}

fn engine_keys<S: Storage + ?Sized>(storage: &S) -> Result<Vec<String>, StorageError> {
    Ok(storage.keys()?.into_iter().filter(|k| k.starts_with(KEY_PREFIX)).collect())
}

/// Inspect every engine key without modifying anything.
///
/// # Errors
///
/// Returns an error if the backend cannot be read.
pub fn scan_health<S: Storage + ?Sized>(storage: &S) -> Result<HealthReport, StorageError> {
    let mut report = HealthReport::default();
    for key in engine_keys(storage)? {
        let value = match storage.get(&key) {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(StorageError::NotText(_)) => {
                warn!(key = %key, "corrupted storage entry: not text");
                report.keys += 1;
                report.corrupted.push(key);
                continue;
            }
            Err(e) => return Err(e),
        };
        report.keys += 1;
        report.bytes += value.len();
        if serde_json::from_str::<serde_json::Value>(&value).is_err() {
            warn!(key = %key, "corrupted storage entry");
            report.corrupted.push(key);
        }
    }
    Ok(report)
}

/// Remove every engine key whose value is not valid JSON. Destructive.
///
/// # Errors
///
/// Returns an error if the backend cannot be read or written.
pub fn clean_corrupted<S: Storage + ?Sized>(storage: &mut S) -> Result<Vec<String>, StorageError> {
    let report = scan_health(storage)?;
    for key in &report.corrupted {
        storage.remove(key)?;
    }
    info!(removed = report.corrupted.len(), "cleaned corrupted storage entries");
    Ok(report.corrupted)
}

/// Remove every engine key. Destructive. Returns the number removed.
///
/// # Errors
///
/// Returns an error if the backend cannot be read or written.
pub fn reset_all<S: Storage + ?Sized>(storage: &mut S) -> Result<usize, StorageError> {
    let mut removed = 0;
    for key in engine_keys(storage)? {
        if storage.remove(&key)? {
            removed += 1;
        }
    }
    info!(removed, "reset all mindmap storage");
    Ok(removed)
}

/// Ids of every mindmap with a stored block list.
///
/// # Errors
///
/// Returns an error if the backend cannot be listed.
pub fn mindmap_ids<S: Storage + ?Sized>(storage: &S) -> Result<Vec<String>, StorageError> {
    let prefix = blocks_key("");
    Ok(storage
        .keys()?
        .into_iter()
        .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
        .filter(|id| !id.is_empty())
        .collect())
}
