//! In-memory [`Storage`] and [`ObjectStorage`] for tests and local development.
//!
//! All tables sit behind one `tokio::sync::RwLock`, so every mutation (including
//! family creation with its admin membership and cascading deletes) happens under
//! a single write lock. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Family, FamilyMember, FamilyRole, FederatedProfile, MemberWithUser, MembershipWithFamily,
    NewFamily, NewLocalUser, Note, NoteWithAuthor, NoteWithAuthorAndPet, Pet, PetFile, User,
    UserInfo, Vaccination, VaccinationWithPet, LOCAL_PROVIDER,
};
use crate::objects::{validate_key, ObjectStorage, StoredObject};
use crate::repo::{Storage, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    families: HashMap<Uuid, Family>,
    members: HashMap<Uuid, FamilyMember>,
    pets: HashMap<Uuid, Pet>,
    notes: HashMap<Uuid, Note>,
    files: HashMap<Uuid, PetFile>,
    vaccinations: HashMap<Uuid, Vaccination>,
}

impl Tables {
    fn info(&self, user_id: Uuid) -> StoreResult<UserInfo> {
        self.users
            .get(&user_id)
            .map(User::to_info)
            .ok_or_else(|| StoreError::Unexpected(anyhow!("dangling user reference {user_id}")))
    }

    fn email_owner(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
    }

    fn remove_pet_cascade(&mut self, pet_id: Uuid) {
        self.notes.retain(|_, n| n.pet_id != pet_id);
        self.files.retain(|_, f| f.pet_id != pet_id);
        self.vaccinations.retain(|_, v| v.pet_id != pet_id);
        self.pets.remove(&pet_id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn truncate<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

#[async_trait]
impl Storage for MemoryStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.email_owner(email).cloned())
    }

    async fn create_local_user(&self, user: NewLocalUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_owner(&user.email).is_some() {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }
        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: Some(user.email),
            first_name: Some(user.first_name),
            last_name: Some(user.last_name),
            profile_image_url: None,
            password_hash: Some(user.password_hash),
            provider: LOCAL_PROVIDER.to_string(),
            provider_subject: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn upsert_federated_user(&self, profile: &FederatedProfile) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .users
            .values()
            .find(|u| {
                u.provider == profile.provider
                    && u.provider_subject.as_deref() == Some(profile.subject.as_str())
            })
            .map(|u| u.id);
        let email = profile.email.clone().filter(|email| {
            tables
                .email_owner(email)
                .is_none_or(|owner| Some(owner.id) == existing)
        });
        let now = Utc::now();
        let record = match existing.and_then(|id| tables.users.get_mut(&id)) {
            Some(user) => {
                user.email = email;
                user.first_name = profile.first_name.clone();
                user.last_name = profile.last_name.clone();
                user.profile_image_url = profile.profile_image_url.clone();
                user.updated_at = now;
                user.clone()
            }
            None => {
                let user = User {
                    id: Uuid::new_v4(),
                    email,
                    first_name: profile.first_name.clone(),
                    last_name: profile.last_name.clone(),
                    profile_image_url: profile.profile_image_url.clone(),
                    password_hash: None,
                    provider: profile.provider.clone(),
                    provider_subject: Some(profile.subject.clone()),
                    created_at: now,
                    updated_at: now,
                };
                tables.users.insert(user.id, user.clone());
                user
            }
        };
        Ok(record)
    }

    async fn create_family(&self, family: NewFamily, creator_id: Uuid) -> StoreResult<Family> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&creator_id) {
            return Err(StoreError::NotFound(format!("user {creator_id}")));
        }
        let now = Utc::now();
        let record = Family {
            id: Uuid::new_v4(),
            name: family.name,
            description: family.description,
            created_at: now,
            updated_at: now,
        };
        let admin = FamilyMember {
            id: Uuid::new_v4(),
            family_id: record.id,
            user_id: creator_id,
            role: FamilyRole::Admin,
            joined_at: now,
        };
        tables.families.insert(record.id, record.clone());
        tables.members.insert(admin.id, admin);
        Ok(record)
    }

    async fn get_family(&self, id: Uuid) -> StoreResult<Option<Family>> {
        Ok(self.tables.read().await.families.get(&id).cloned())
    }

    async fn delete_family(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let pets: Vec<Uuid> = tables
            .pets
            .values()
            .filter(|p| p.family_id == id)
            .map(|p| p.id)
            .collect();
        for pet_id in pets {
            tables.remove_pet_cascade(pet_id);
        }
        tables.members.retain(|_, m| m.family_id != id);
        tables.families.remove(&id);
        Ok(())
    }

    async fn list_family_members(&self, family_id: Uuid) -> StoreResult<Vec<MemberWithUser>> {
        let tables = self.tables.read().await;
        let mut members: Vec<&FamilyMember> = tables
            .members
            .values()
            .filter(|m| m.family_id == family_id)
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.id));
        members
            .into_iter()
            .map(|m| -> StoreResult<MemberWithUser> {
                Ok(MemberWithUser {
                    member: m.clone(),
                    user: tables.info(m.user_id)?,
                })
            })
            .collect()
    }

    async fn list_user_families(&self, user_id: Uuid) -> StoreResult<Vec<MembershipWithFamily>> {
        let tables = self.tables.read().await;
        let mut members: Vec<&FamilyMember> = tables
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.id));
        Ok(members
            .into_iter()
            .filter_map(|m| {
                let family = tables.families.get(&m.family_id)?.clone();
                Some(MembershipWithFamily {
                    member: m.clone(),
                    family,
                })
            })
            .collect())
    }

    async fn get_membership(
        &self,
        family_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<FamilyMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.family_id == family_id && m.user_id == user_id)
            .cloned())
    }

    async fn count_family_members(&self, family_id: Uuid) -> StoreResult<usize> {
        let tables = self.tables.read().await;
        Ok(tables.members.values().filter(|m| m.family_id == family_id).count())
    }

    async fn add_family_member(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        role: FamilyRole,
    ) -> StoreResult<FamilyMember> {
        let mut tables = self.tables.write().await;
        if !tables.families.contains_key(&family_id) {
            return Err(StoreError::NotFound(format!("family {family_id}")));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        if tables
            .members
            .values()
            .any(|m| m.family_id == family_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict(format!(
                "user {user_id} is already a member of family {family_id}"
            )));
        }
        let member = FamilyMember {
            id: Uuid::new_v4(),
            family_id,
            user_id,
            role,
            joined_at: Utc::now(),
        };
        tables.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn remove_family_member(&self, family_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .members
            .retain(|_, m| !(m.family_id == family_id && m.user_id == user_id));
        Ok(())
    }

    async fn update_family_member_role(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        role: FamilyRole,
    ) -> StoreResult<FamilyMember> {
        let mut tables = self.tables.write().await;
        let member = tables
            .members
            .values_mut()
            .find(|m| m.family_id == family_id && m.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(format!("membership of {user_id}")))?;
        member.role = role;
        Ok(member.clone())
    }

    async fn create_pet(&self, pet: Pet) -> StoreResult<Pet> {
        let mut tables = self.tables.write().await;
        if !tables.families.contains_key(&pet.family_id) {
            return Err(StoreError::NotFound(format!("family {}", pet.family_id)));
        }
        tables.pets.insert(pet.id, pet.clone());
        Ok(pet)
    }

    async fn get_pet(&self, id: Uuid) -> StoreResult<Option<Pet>> {
        Ok(self.tables.read().await.pets.get(&id).cloned())
    }

    async fn list_family_pets(&self, family_id: Uuid) -> StoreResult<Vec<Pet>> {
        let tables = self.tables.read().await;
        let mut pets: Vec<Pet> = tables
            .pets
            .values()
            .filter(|p| p.family_id == family_id)
            .cloned()
            .collect();
        pets.sort_by_key(|p| (p.created_at, p.id));
        Ok(pets)
    }

    async fn update_pet(&self, pet: Pet) -> StoreResult<Pet> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .pets
            .get_mut(&pet.id)
            .ok_or_else(|| StoreError::NotFound(format!("pet {}", pet.id)))?;
        *slot = pet.clone();
        Ok(pet)
    }

    async fn delete_pet(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.remove_pet_cascade(id);
        Ok(())
    }

    async fn create_note(&self, note: Note) -> StoreResult<Note> {
        let mut tables = self.tables.write().await;
        if !tables.pets.contains_key(&note.pet_id) {
            return Err(StoreError::NotFound(format!("pet {}", note.pet_id)));
        }
        tables.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn get_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(self.tables.read().await.notes.get(&id).cloned())
    }

    async fn update_note(&self, note: Note) -> StoreResult<Note> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .notes
            .get_mut(&note.id)
            .ok_or_else(|| StoreError::NotFound(format!("note {}", note.id)))?;
        *slot = note.clone();
        Ok(note)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.notes.remove(&id);
        Ok(())
    }

    async fn list_pet_notes(
        &self,
        pet_id: Uuid,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NoteWithAuthor>> {
        let tables = self.tables.read().await;
        let mut notes: Vec<&Note> = tables.notes.values().filter(|n| n.pet_id == pet_id).collect();
        notes.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        let notes = notes
            .into_iter()
            .map(|n| -> StoreResult<NoteWithAuthor> {
                Ok(NoteWithAuthor {
                    note: n.clone(),
                    author: tables.info(n.author_id)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(truncate(notes, limit))
    }

    async fn list_family_notes(
        &self,
        family_id: Uuid,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NoteWithAuthorAndPet>> {
        let tables = self.tables.read().await;
        let mut notes: Vec<(&Note, &Pet)> = tables
            .notes
            .values()
            .filter_map(|n| {
                let pet = tables.pets.get(&n.pet_id)?;
                (pet.family_id == family_id).then_some((n, pet))
            })
            .collect();
        notes.sort_by(|(a, _), (b, _)| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        let notes = notes
            .into_iter()
            .map(|(n, pet)| -> StoreResult<NoteWithAuthorAndPet> {
                Ok(NoteWithAuthorAndPet {
                    note: n.clone(),
                    author: tables.info(n.author_id)?,
                    pet: pet.clone(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(truncate(notes, limit))
    }

    async fn create_pet_file(&self, file: PetFile) -> StoreResult<PetFile> {
        let mut tables = self.tables.write().await;
        if !tables.pets.contains_key(&file.pet_id) {
            return Err(StoreError::NotFound(format!("pet {}", file.pet_id)));
        }
        tables.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn get_pet_file(&self, id: Uuid) -> StoreResult<Option<PetFile>> {
        Ok(self.tables.read().await.files.get(&id).cloned())
    }

    async fn list_pet_files(&self, pet_id: Uuid) -> StoreResult<Vec<PetFile>> {
        let tables = self.tables.read().await;
        let mut files: Vec<PetFile> = tables
            .files
            .values()
            .filter(|f| f.pet_id == pet_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(files)
    }

    async fn delete_pet_file(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.files.remove(&id);
        Ok(())
    }

    async fn create_vaccination(&self, vaccination: Vaccination) -> StoreResult<Vaccination> {
        let mut tables = self.tables.write().await;
        if !tables.pets.contains_key(&vaccination.pet_id) {
            return Err(StoreError::NotFound(format!("pet {}", vaccination.pet_id)));
        }
        tables.vaccinations.insert(vaccination.id, vaccination.clone());
        Ok(vaccination)
    }

    async fn get_vaccination(&self, id: Uuid) -> StoreResult<Option<Vaccination>> {
        Ok(self.tables.read().await.vaccinations.get(&id).cloned())
    }

    async fn update_vaccination(&self, vaccination: Vaccination) -> StoreResult<Vaccination> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .vaccinations
            .get_mut(&vaccination.id)
            .ok_or_else(|| StoreError::NotFound(format!("vaccination {}", vaccination.id)))?;
        *slot = vaccination.clone();
        Ok(vaccination)
    }

    async fn delete_vaccination(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.vaccinations.remove(&id);
        Ok(())
    }

    async fn list_pet_vaccinations(&self, pet_id: Uuid) -> StoreResult<Vec<Vaccination>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Vaccination> = tables
            .vaccinations
            .values()
            .filter(|v| v.pet_id == pet_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.date_administered
                .cmp(&a.date_administered)
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn upcoming_vaccinations(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<VaccinationWithPet>> {
        let tables = self.tables.read().await;
        let mut items: Vec<VaccinationWithPet> = tables
            .vaccinations
            .values()
            .filter(|v| v.is_upcoming(now))
            .filter_map(|v| {
                let pet = tables.pets.get(&v.pet_id)?;
                (pet.family_id == family_id).then(|| VaccinationWithPet {
                    vaccination: v.clone(),
                    pet: pet.clone(),
                })
            })
            .collect();
        items.sort_by_key(|v| (v.vaccination.next_due_date, v.vaccination.id));
        Ok(items)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// In-memory object storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryObjects {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjects {
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> StoreResult<()> {
        validate_key(key)?;
        let object = StoredObject {
            content_type: content_type.to_string(),
            data,
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        validate_key(key)?;
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}
