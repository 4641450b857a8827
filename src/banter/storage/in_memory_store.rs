use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::StorageResult;
use super::local_store::LocalStore;

/// In-memory key-value store
/// Useful for testing and development
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LocalStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = InMemoryStore::new();

        store.set("conversations", "[]").unwrap();

        let value = store.get("conversations").unwrap();
        assert_eq!(value.as_deref(), Some("[]"));
    }

    #[test]
    fn test_get_absent_key() {
        let store = InMemoryStore::new();

        let value = store.get("missing").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let store = InMemoryStore::new();

        store.set("key", "first").unwrap();
        store.set("key", "second").unwrap();

        assert_eq!(store.get("key").unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let store = InMemoryStore::new();

        store.set("key", "value").unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();

        assert!(store.get("key").unwrap().is_none());
    }
}
