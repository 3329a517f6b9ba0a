//! JSON-file-backed store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::{KeyValueStore, StorageError};

/// Key-value store persisted as a single JSON object file.
///
/// The whole map is kept in memory and written through on every
/// mutation. Clones share the same cache and file. This backs the
/// persistent customer scope and the guest cart snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    file_path: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl JsonFileStore {
    /// Open a store at `path`, creating parent directories as needed.
    ///
    /// An unreadable or corrupt file is logged and treated as empty
    /// rather than refusing to start.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file_path = path.as_ref().to_path_buf();

        if let Some(parent) = file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let entries = if file_path.exists() {
            load_entries(&file_path)
        } else {
            HashMap::new()
        };

        Ok(Self {
            file_path,
            cache: Arc::new(RwLock::new(entries)),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.file_path, json)?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> HashMap<String, String> {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt store file, starting empty");
                HashMap::new()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable store file, starting empty");
            HashMap::new()
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let cache = self.cache.read().map_err(|_| StorageError::Poisoned)?;
        Ok(cache.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut cache = self.cache.write().map_err(|_| StorageError::Poisoned)?;
        cache.insert(key.to_string(), value.to_string());
        self.persist(&cache)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut cache = self.cache.write().map_err(|_| StorageError::Poisoned)?;
        cache.remove(key);
        self.persist(&cache)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "giftsouq-store-{}-{name}.json",
            std::process::id()
        ))
    }

    #[test]
    fn test_roundtrip_across_reopen() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path);

        let store = JsonFileStore::open(&path).unwrap();
        store.set("token", "abc").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("token").unwrap(), Some("abc".to_string()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_remove_persists() {
        let path = temp_path("remove");
        let _ = fs::remove_file(&path);

        let store = JsonFileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
