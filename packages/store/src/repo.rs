//! # Repository: the persistence seam for pet families
//!
//! [`Storage`] is the one trait every handler talks to. Two backends implement it:
//! [`crate::MemoryStore`] (tests and local development) and the Postgres storage in
//! the `api` crate. Both uphold the same guarantees:
//!
//! - Creating a family also creates the creator's `admin` membership, atomically.
//! - A `(family, user)` pair has at most one membership; a duplicate insert is a
//!   [`StoreError::Conflict`].
//! - Deleting a pet removes its notes, files and vaccinations. Deleting a family
//!   removes its memberships and pets (and, transitively, their children).
//! - Listing queries return deterministic order:
//!
//! | Query | Order |
//! |-------|-------|
//! | [`list_pet_notes`](Storage::list_pet_notes) / [`list_family_notes`](Storage::list_family_notes) | `date` descending |
//! | [`list_pet_vaccinations`](Storage::list_pet_vaccinations) | `date_administered` descending |
//! | [`upcoming_vaccinations`](Storage::upcoming_vaccinations) | `next_due_date` ascending |
//! | [`list_pet_files`](Storage::list_pet_files) | `created_at` descending |
//! | [`list_family_pets`](Storage::list_family_pets) | `created_at` ascending |
//! | [`list_family_members`](Storage::list_family_members) / [`list_user_families`](Storage::list_user_families) | `joined_at` ascending |
//!
//! Authorisation is not the store's concern: callers check membership before they
//! reach it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    FamilyRole, Family, FamilyMember, FederatedProfile, MemberWithUser, MembershipWithFamily,
    NewFamily, NewLocalUser, Note, NoteWithAuthor, NoteWithAuthorAndPet, Pet, PetFile, User,
    Vaccination, VaccinationWithPet,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::Conflict`] when the email is already registered.
    async fn create_local_user(&self, user: NewLocalUser) -> StoreResult<User>;
    /// Insert or refresh the user keyed by `(provider, subject)`. If the profile's
    /// email already belongs to another user, the record is stored without an email.
    async fn upsert_federated_user(&self, profile: &FederatedProfile) -> StoreResult<User>;

    // Families and memberships
    async fn create_family(&self, family: NewFamily, creator_id: Uuid) -> StoreResult<Family>;
    async fn get_family(&self, id: Uuid) -> StoreResult<Option<Family>>;
    async fn delete_family(&self, id: Uuid) -> StoreResult<()>;
    async fn list_family_members(&self, family_id: Uuid) -> StoreResult<Vec<MemberWithUser>>;
    async fn list_user_families(&self, user_id: Uuid) -> StoreResult<Vec<MembershipWithFamily>>;
    async fn get_membership(
        &self,
        family_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<FamilyMember>>;
    async fn count_family_members(&self, family_id: Uuid) -> StoreResult<usize>;
    async fn add_family_member(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        role: FamilyRole,
    ) -> StoreResult<FamilyMember>;
    /// Removing an absent membership is not an error.
    async fn remove_family_member(&self, family_id: Uuid, user_id: Uuid) -> StoreResult<()>;
    async fn update_family_member_role(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        role: FamilyRole,
    ) -> StoreResult<FamilyMember>;

    // Pets
    async fn create_pet(&self, pet: Pet) -> StoreResult<Pet>;
    async fn get_pet(&self, id: Uuid) -> StoreResult<Option<Pet>>;
    async fn list_family_pets(&self, family_id: Uuid) -> StoreResult<Vec<Pet>>;
    async fn update_pet(&self, pet: Pet) -> StoreResult<Pet>;
    async fn delete_pet(&self, id: Uuid) -> StoreResult<()>;

    // Notes
    async fn create_note(&self, note: Note) -> StoreResult<Note>;
    async fn get_note(&self, id: Uuid) -> StoreResult<Option<Note>>;
    async fn update_note(&self, note: Note) -> StoreResult<Note>;
    async fn delete_note(&self, id: Uuid) -> StoreResult<()>;
    async fn list_pet_notes(
        &self,
        pet_id: Uuid,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NoteWithAuthor>>;
    async fn list_family_notes(
        &self,
        family_id: Uuid,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NoteWithAuthorAndPet>>;

    // Files
    async fn create_pet_file(&self, file: PetFile) -> StoreResult<PetFile>;
    async fn get_pet_file(&self, id: Uuid) -> StoreResult<Option<PetFile>>;
    async fn list_pet_files(&self, pet_id: Uuid) -> StoreResult<Vec<PetFile>>;
    async fn delete_pet_file(&self, id: Uuid) -> StoreResult<()>;

    // Vaccinations
    async fn create_vaccination(&self, vaccination: Vaccination) -> StoreResult<Vaccination>;
    async fn get_vaccination(&self, id: Uuid) -> StoreResult<Option<Vaccination>>;
    async fn update_vaccination(&self, vaccination: Vaccination) -> StoreResult<Vaccination>;
    async fn delete_vaccination(&self, id: Uuid) -> StoreResult<()>;
    async fn list_pet_vaccinations(&self, pet_id: Uuid) -> StoreResult<Vec<Vaccination>>;
    async fn upcoming_vaccinations(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<VaccinationWithPet>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound("row".into());
        }
        let db_err = err.as_database_error();
        let code = db_err.and_then(|e| e.code()).map(|c| c.into_owned());
        let message = db_err.map(|e| e.message().to_string()).unwrap_or_default();
        match code.as_deref() {
            // unique_violation
            Some("23505") => StoreError::Conflict(message),
            // foreign_key_violation
            Some("23503") => StoreError::NotFound(message),
            _ => StoreError::Unexpected(err.into()),
        }
    }
}
