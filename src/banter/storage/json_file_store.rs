use std::path::PathBuf;

use super::error::{StorageError, StorageResult};
use super::local_store::LocalStore;

/// File-backed key-value store
/// Stores each key as a separate file in ~/.config/banter/store/
pub struct JsonFileStore {
    store_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new() -> StorageResult<Self> {
        let store_dir = dirs::config_dir()
            .ok_or_else(|| StorageError::Initialization {
                message: "Could not determine config directory".to_string(),
            })?
            .join("banter")
            .join("store");

        Ok(Self { store_dir })
    }

    /// Create a store rooted at an explicit directory (used by tests and the
    /// `--data-dir` override).
    pub fn with_dir(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", key))
    }
}

impl LocalStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        std::fs::create_dir_all(&self.store_dir)?;

        let path = self.key_path(key);

        // Write to file atomically (write to temp, then rename)
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key);

        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_dir(dir.path());

        store.set("conversations", r#"[{"id":"1"}]"#).unwrap();

        let value = store.get("conversations").unwrap();
        assert_eq!(value.as_deref(), Some(r#"[{"id":"1"}]"#));
    }

    #[test]
    fn test_get_absent_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_dir(dir.path());

        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_value_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JsonFileStore::with_dir(dir.path());
            store.set("conversations", "[]").unwrap();
        }

        let reopened = JsonFileStore::with_dir(dir.path());
        assert_eq!(reopened.get("conversations").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_set_overwrites_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_dir(dir.path());

        store.set("key", "first").unwrap();
        store.set("key", "second").unwrap();

        assert_eq!(store.get("key").unwrap().as_deref(), Some("second"));
        // No temp file left behind
        assert!(!dir.path().join("key.json.tmp").exists());
    }

    #[test]
    fn test_remove_deletes_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_dir(dir.path());

        store.set("key", "value").unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();

        assert!(store.get("key").unwrap().is_none());
    }
}
