//! Opaque byte storage for uploaded pet files.
//!
//! Keys are relative, slash-separated paths such as `uploads/<uuid>`. The HTTP layer
//! exposes them under `/objects/<key>`.

use async_trait::async_trait;

use crate::repo::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> StoreResult<()>;
    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>>;
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Reject keys that could escape the store root.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StoreError::Invalid(format!("object key {key:?}")));
    }
    Ok(())
}
