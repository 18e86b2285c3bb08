//! # Device Key/Value Storage
//!
//! Small records that belong to this terminal rather than the store database:
//! the held-sale list and the selected delivery location.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  KeyValueStore                                                          │
//! │     │                                                                   │
//! │     ├── FileStore    <data_dir>/device/<key>.json   (on the terminal)   │
//! │     └── MemoryStore  HashMap behind a Mutex          (tests, kiosks)    │
//! │                                                                         │
//! │  Keys in use:  pos_held_sales      selected_location                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::{PosError, PosResult};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PosResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PosResult<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> PosResult<()>;
}

/// Reads and decodes a JSON value.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> PosResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> PosResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// =============================================================================
// File Store
// =============================================================================

/// One JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> PosResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!(?dir, "Device store opened");
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PosResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PosError::Storage(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid storage key '{}'", key),
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PosResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temp file and renames it over the old one.
    fn set(&self, key: &str, value: &str) -> PosResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PosResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(?path, error = %e, "Failed to remove stored key");
                Err(e.into())
            }
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PosResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PosResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PosResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
