pub mod error;
pub mod in_memory_store;
pub mod json_file_store;
pub mod local_store;

pub use error::{StorageError, StorageResult};
pub use in_memory_store::InMemoryStore;
pub use json_file_store::JsonFileStore;
pub use local_store::LocalStore;
