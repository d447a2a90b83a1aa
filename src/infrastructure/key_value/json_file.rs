//! Key-value store persisted to a single JSON file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::domain::response_cache::KeyValueStore;
use crate::domain::DomainError;

/// Store whose contents live in one JSON object on disk.
///
/// The file is read once on open and rewritten after every mutation. A
/// missing file starts empty; an unreadable or corrupt one starts empty
/// with a warning.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileKeyValueStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load(&path);

        debug!(path = %path.display(), entries = entries.len(), "Opened JSON key-value store");

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, DomainError> {
        self.entries
            .lock()
            .map_err(|e| DomainError::storage(format!("Failed to acquire lock: {}", e)))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let data = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, data).map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

fn load(path: &Path) -> BTreeMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), "Key-value file is corrupt, starting empty: {}", e);
                BTreeMap::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), "Failed to read key-value file, starting empty: {}", e);
            BTreeMap::new()
        }
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut entries = self.lock()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKeyValueStore::open(dir.path().join("kv.json"));

        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kv.json");

        let store = JsonFileKeyValueStore::open(&path);
        store.set("a", "{\"x\":1}").unwrap();
        store.set("b", "two").unwrap();
        store.delete("b").unwrap();
        drop(store);

        let reopened = JsonFileKeyValueStore::open(&path);
        assert_eq!(reopened.get("a").unwrap(), Some("{\"x\":1}".to_string()));
        assert_eq!(reopened.get("b").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        std::fs::write(&path, "not json {").unwrap();

        let store = JsonFileKeyValueStore::open(&path);
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(
            JsonFileKeyValueStore::open(&path).get("a").unwrap(),
            Some("1".to_string())
        );
    }

    #[test]
    fn test_write_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // The directory itself cannot be written as a file
        let store = JsonFileKeyValueStore::open(dir.path());

        let err = store.set("a", "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
