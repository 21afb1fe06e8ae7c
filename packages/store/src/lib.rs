pub mod models;
pub mod objects;
pub mod repo;

mod file_store;
mod memory;

pub use file_store::FileStore;
pub use memory::{MemoryObjects, MemoryStore};
pub use objects::{ObjectStorage, StoredObject};
pub use repo::{Storage, StoreError, StoreResult};
