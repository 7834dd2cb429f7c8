//! Durable key-value storage.
//!
//! The planner only ever stores a handful of JSON strings under fixed keys.
//! `KeyValueStore` abstracts over where they live so the registry can be
//! exercised against memory in tests and against files from the CLI.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use yearplan_core::StorageError;

/// Key holding the serialized `CalendarRegistry`.
pub const REGISTRY_STORAGE_KEY: &str = "calendar_registry";

/// Key holding the local calendar's `StoredData` in the pre-registry format.
pub const LEGACY_STORAGE_KEY: &str = "calendar_data";

/// String-valued key-value storage capability.
///
/// Calls are synchronous and expected to be fast. Implementations don't need
/// to coordinate between handles: concurrent writers are last-write-wins.
pub trait KeyValueStore {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryInner {
    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

/// In-memory store.
///
/// Clones share the same entries, which is how tests model two browser tabs
/// pointed at one profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes fail once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::default();
        store.inner.lock().quota = Some(bytes);
        store
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        self.inner.lock().quota = bytes;
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if let Some(quota) = inner.quota {
            let needed = inner.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::write(
                    key,
                    format!("quota exceeded ({} > {} bytes)", needed, quota),
                ));
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.lock().entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`. The directory is created on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| StorageError::read(key, e))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::write(key, e))?;

        // write-then-rename so a crash never leaves a half-written file
        let temp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&temp, value).map_err(|e| StorageError::write(key, e))?;
        fs::rename(&temp, &path).map_err(|e| StorageError::write(key, e))?;

        tracing::debug!("Stored '{}' at {:?}", key, path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StorageError::remove(key, e))?;
            tracing::debug!("Removed '{}'", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.is_empty());
        // removing twice is fine
        store.remove("a").unwrap();
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let tab_one = MemoryStore::new();
        let tab_two = tab_one.clone();
        tab_one.set("k", "first").unwrap();
        tab_two.set("k", "second").unwrap();
        assert_eq!(tab_one.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();
        // replacing an existing value only counts the new size
        store.set("k", "123456789").unwrap();
        let err = store.set("other", "123456").unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(!store.contains_key("other"));

        store.set_quota(None);
        store.set("other", "123456").unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data");

        let store = FileStore::new(&path);
        assert_eq!(store.get(REGISTRY_STORAGE_KEY).unwrap(), None);
        store.set(REGISTRY_STORAGE_KEY, "{\"x\":1}").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get(REGISTRY_STORAGE_KEY).unwrap().as_deref(),
            Some("{\"x\":1}")
        );
        assert!(path.join("calendar_registry.json").exists());
        assert!(!path.join("calendar_registry.json.tmp").exists());

        reopened.remove(REGISTRY_STORAGE_KEY).unwrap();
        assert_eq!(store.get(REGISTRY_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }
}
