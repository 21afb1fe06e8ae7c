//! # Filesystem-backed object store
//!
//! [`FileStore`] is an [`ObjectStorage`] implementation that keeps uploaded pet
//! files on local disk, under the configured upload directory.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── objects/
//! │   └── uploads/<uuid>     # raw bytes
//! └── meta/
//!     └── uploads/<uuid>     # content type, one line
//! ```

use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;

use crate::objects::{validate_key, ObjectStorage, StoredObject};
use crate::repo::StoreResult;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base.join("objects").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.base.join("meta").join(key)
    }
}

async fn write_file(path: PathBuf, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("write {}", path.display()))
}

async fn remove_file(path: PathBuf) -> anyhow::Result<()> {
    match tokio::fs::remove_file(&path).await {
        Err(err) if err.kind() != ErrorKind::NotFound => {
            Err(err).with_context(|| format!("remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl ObjectStorage for FileStore {
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> StoreResult<()> {
        validate_key(key)?;
        write_file(self.object_path(key), &data).await?;
        write_file(self.meta_path(key), content_type.as_bytes()).await?;
        tracing::debug!(key, bytes = data.len(), "stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        validate_key(key)?;
        let path = self.object_path(key);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("read {}", path.display()))
                    .into())
            }
        };
        let content_type = tokio::fs::read_to_string(self.meta_path(key))
            .await
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string());
        Ok(Some(StoredObject { content_type, data }))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        remove_file(self.object_path(key)).await?;
        remove_file(self.meta_path(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::new(dir.path());
        store
            .put("uploads/photo", "image/png", vec![1, 2, 3])
            .await
            .unwrap();

        // Re-open from same directory
        let reopened = FileStore::new(dir.path());
        let object = reopened.get("uploads/photo").await.unwrap().unwrap();
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.data, vec![1, 2, 3]);

        reopened.delete("uploads/photo").await.unwrap();
        assert!(reopened.get("uploads/photo").await.unwrap().is_none());
        // Deleting twice is fine
        reopened.delete("uploads/photo").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.put("../escape", "text/plain", vec![]).await.is_err());
    }
}
