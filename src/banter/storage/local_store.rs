use super::error::StorageResult;

/// Durable string-keyed store for serialized application state.
///
/// Implementations only need get/set/remove semantics; callers own the
/// serialization format of the values they store. This trait is object-safe
/// and is used as `Arc<dyn LocalStore>`.
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key` entirely. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
