//! File metadata attached to pets. The bytes live in [`crate::ObjectStorage`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PetFile {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub uploader_id: Uuid,
    pub file_name: String,
    /// MIME type as reported by the uploader.
    pub file_type: String,
    pub file_size: Option<i64>,
    /// `/objects/<key>` for stored uploads, or an external URL.
    pub file_path: String,
    pub description: Option<String>,
    /// "medical", "photo", "document", "vaccination"
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPetFile {
    pub pet_id: Uuid,
    #[serde(skip_deserializing)]
    pub uploader_id: Uuid,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    pub file_size: Option<i64>,
    #[serde(default)]
    pub file_path: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl PetFile {
    pub fn create(new: NewPetFile, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pet_id: new.pet_id,
            uploader_id: new.uploader_id,
            file_name: new.file_name,
            file_type: new.file_type,
            file_size: new.file_size,
            file_path: new.file_path,
            description: new.description,
            category: new.category,
            created_at: now,
        }
    }

    /// The object-store key when `file_path` points into the local object store.
    pub fn object_key(&self) -> Option<&str> {
        self.file_path.strip_prefix("/objects/")
    }
}
