//! PostgreSQL implementation of [`Storage`].
//!
//! Rows map straight onto the store models through `sqlx::FromRow`; the text enums
//! (`role`, `note_type`, `frequency`, `mood`) bind and decode through their own
//! sqlx codecs. Joined views are assembled from a second `= ANY($1)` query rather
//! than wide joins so each model keeps a single row shape.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use store::models::{
    Family, FamilyMember, FamilyRole, FederatedProfile, MemberWithUser, MembershipWithFamily,
    NewFamily, NewLocalUser, Note, NoteWithAuthor, NoteWithAuthorAndPet, Pet, PetFile, User,
    UserInfo, Vaccination, VaccinationWithPet, LOCAL_PROVIDER,
};
use store::{Storage, StoreError, StoreResult};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn user_infos(&self, ids: Vec<Uuid>) -> StoreResult<HashMap<Uuid, UserInfo>> {
        let users: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u.to_info())).collect())
    }

    async fn pets_by_id(&self, ids: Vec<Uuid>) -> StoreResult<HashMap<Uuid, Pet>> {
        let pets: Vec<Pet> = sqlx::query_as("SELECT * FROM pets WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(pets.into_iter().map(|p| (p.id, p)).collect())
    }
}

fn lookup<T: Clone>(map: &HashMap<Uuid, T>, id: Uuid, what: &str) -> StoreResult<T> {
    map.get(&id)
        .cloned()
        .ok_or_else(|| StoreError::Unexpected(anyhow::anyhow!("dangling {what} reference {id}")))
}

fn limit_param(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_local_user(&self, user: NewLocalUser) -> StoreResult<User> {
        Ok(sqlx::query_as(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash, provider)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(LOCAL_PROVIDER)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn upsert_federated_user(&self, profile: &FederatedProfile) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;
        let email_taken = match &profile.email {
            Some(email) => sqlx::query_scalar::<_, Uuid>(
                r#"
                SELECT id FROM users
                WHERE lower(email) = lower($1)
                  AND NOT (provider = $2 AND provider_subject IS NOT DISTINCT FROM $3)
                "#,
            )
            .bind(email)
            .bind(&profile.provider)
            .bind(&profile.subject)
            .fetch_optional(&mut *tx)
            .await?
            .is_some(),
            None => false,
        };
        let email = if email_taken { None } else { profile.email.clone() };

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, first_name, last_name, profile_image_url, provider, provider_subject)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider, provider_subject)
            DO UPDATE SET
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                profile_image_url = EXCLUDED.profile_image_url,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.profile_image_url)
        .bind(&profile.provider)
        .bind(&profile.subject)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn create_family(&self, family: NewFamily, creator_id: Uuid) -> StoreResult<Family> {
        let mut tx = self.pool.begin().await?;
        let record: Family = sqlx::query_as(
            "INSERT INTO families (id, name, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&family.name)
        .bind(&family.description)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query("INSERT INTO family_members (id, family_id, user_id, role) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(record.id)
            .bind(creator_id)
            .bind(FamilyRole::Admin)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn get_family(&self, id: Uuid) -> StoreResult<Option<Family>> {
        Ok(sqlx::query_as("SELECT * FROM families WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_family(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM families WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_family_members(&self, family_id: Uuid) -> StoreResult<Vec<MemberWithUser>> {
        let members: Vec<FamilyMember> = sqlx::query_as(
            "SELECT * FROM family_members WHERE family_id = $1 ORDER BY joined_at, id",
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await?;
        let users = self
            .user_infos(members.iter().map(|m| m.user_id).collect())
            .await?;
        members
            .into_iter()
            .map(|member| -> StoreResult<MemberWithUser> {
                let user = lookup(&users, member.user_id, "user")?;
                Ok(MemberWithUser { member, user })
            })
            .collect()
    }

    async fn list_user_families(&self, user_id: Uuid) -> StoreResult<Vec<MembershipWithFamily>> {
        let members: Vec<FamilyMember> = sqlx::query_as(
            "SELECT * FROM family_members WHERE user_id = $1 ORDER BY joined_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let ids: Vec<Uuid> = members.iter().map(|m| m.family_id).collect();
        let families: Vec<Family> = sqlx::query_as("SELECT * FROM families WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let families: HashMap<Uuid, Family> = families.into_iter().map(|f| (f.id, f)).collect();
        members
            .into_iter()
            .map(|member| -> StoreResult<MembershipWithFamily> {
                let family = lookup(&families, member.family_id, "family")?;
                Ok(MembershipWithFamily { member, family })
            })
            .collect()
    }

    async fn get_membership(
        &self,
        family_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<FamilyMember>> {
        Ok(sqlx::query_as("SELECT * FROM family_members WHERE family_id = $1 AND user_id = $2")
            .bind(family_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_family_members(&self, family_id: Uuid) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM family_members WHERE family_id = $1")
            .bind(family_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn add_family_member(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        role: FamilyRole,
    ) -> StoreResult<FamilyMember> {
        let result: Result<FamilyMember, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO family_members (id, family_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(family_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await;
        match result {
            Ok(member) => Ok(member),
            Err(err) => match StoreError::from(err) {
                StoreError::Conflict(_) => Err(StoreError::Conflict(format!(
                    "user {user_id} is already a member of family {family_id}"
                ))),
                StoreError::NotFound(_) => Err(StoreError::NotFound(format!(
                    "family {family_id} or user {user_id}"
                ))),
                other => Err(other),
            },
        }
    }

    async fn remove_family_member(&self, family_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM family_members WHERE family_id = $1 AND user_id = $2")
            .bind(family_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_family_member_role(
        &self,
        family_id: Uuid,
        user_id: Uuid,
        role: FamilyRole,
    ) -> StoreResult<FamilyMember> {
        sqlx::query_as(
            "UPDATE family_members SET role = $3 WHERE family_id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(family_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("membership of {user_id}")))
    }

    async fn create_pet(&self, pet: Pet) -> StoreResult<Pet> {
        sqlx::query(
            r#"
            INSERT INTO pets (
                id, family_id, name, species, breed, gender, birth_date, weight, color,
                microchip, description, profile_image_url, vet_name, vet_clinic, allergies,
                medications, location, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(pet.id)
        .bind(pet.family_id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(&pet.gender)
        .bind(pet.birth_date)
        .bind(&pet.weight)
        .bind(&pet.color)
        .bind(&pet.microchip)
        .bind(&pet.description)
        .bind(&pet.profile_image_url)
        .bind(&pet.vet_name)
        .bind(&pet.vet_clinic)
        .bind(&pet.allergies)
        .bind(&pet.medications)
        .bind(&pet.location)
        .bind(pet.created_at)
        .bind(pet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(pet)
    }

    async fn get_pet(&self, id: Uuid) -> StoreResult<Option<Pet>> {
        Ok(sqlx::query_as("SELECT * FROM pets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_family_pets(&self, family_id: Uuid) -> StoreResult<Vec<Pet>> {
        Ok(sqlx::query_as("SELECT * FROM pets WHERE family_id = $1 ORDER BY created_at, id")
            .bind(family_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_pet(&self, pet: Pet) -> StoreResult<Pet> {
        let updated = sqlx::query(
            r#"
            UPDATE pets SET
                name = $2, species = $3, breed = $4, gender = $5, birth_date = $6, weight = $7,
                color = $8, microchip = $9, description = $10, profile_image_url = $11,
                vet_name = $12, vet_clinic = $13, allergies = $14, medications = $15,
                location = $16, updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(pet.id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(&pet.gender)
        .bind(pet.birth_date)
        .bind(&pet.weight)
        .bind(&pet.color)
        .bind(&pet.microchip)
        .bind(&pet.description)
        .bind(&pet.profile_image_url)
        .bind(&pet.vet_name)
        .bind(&pet.vet_clinic)
        .bind(&pet.allergies)
        .bind(&pet.medications)
        .bind(&pet.location)
        .bind(pet.updated_at)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("pet {}", pet.id)));
        }
        Ok(pet)
    }

    async fn delete_pet(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_note(&self, note: Note) -> StoreResult<Note> {
        sqlx::query(
            r#"
            INSERT INTO notes (
                id, pet_id, author_id, note_type, title, content, date, due_date, frequency,
                completed, vet_name, vet_clinic, medications, vaccinations, mood,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(note.id)
        .bind(note.pet_id)
        .bind(note.author_id)
        .bind(note.note_type)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.date)
        .bind(note.due_date)
        .bind(note.frequency)
        .bind(note.completed)
        .bind(&note.vet_name)
        .bind(&note.vet_clinic)
        .bind(&note.medications)
        .bind(&note.vaccinations)
        .bind(note.mood)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(note)
    }

    async fn get_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(sqlx::query_as("SELECT * FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_note(&self, note: Note) -> StoreResult<Note> {
        let updated = sqlx::query(
            r#"
            UPDATE notes SET
                note_type = $2, title = $3, content = $4, date = $5, due_date = $6,
                frequency = $7, completed = $8, vet_name = $9, vet_clinic = $10,
                medications = $11, vaccinations = $12, mood = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(note.id)
        .bind(note.note_type)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.date)
        .bind(note.due_date)
        .bind(note.frequency)
        .bind(note.completed)
        .bind(&note.vet_name)
        .bind(&note.vet_clinic)
        .bind(&note.medications)
        .bind(&note.vaccinations)
        .bind(note.mood)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("note {}", note.id)));
        }
        Ok(note)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_pet_notes(
        &self,
        pet_id: Uuid,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NoteWithAuthor>> {
        let notes: Vec<Note> = sqlx::query_as(
            "SELECT * FROM notes WHERE pet_id = $1 ORDER BY date DESC, id LIMIT $2",
        )
        .bind(pet_id)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;
        let authors = self
            .user_infos(notes.iter().map(|n| n.author_id).collect())
            .await?;
        notes
            .into_iter()
            .map(|note| -> StoreResult<NoteWithAuthor> {
                let author = lookup(&authors, note.author_id, "author")?;
                Ok(NoteWithAuthor { note, author })
            })
            .collect()
    }

    async fn list_family_notes(
        &self,
        family_id: Uuid,
        limit: Option<usize>,
    ) -> StoreResult<Vec<NoteWithAuthorAndPet>> {
        let notes: Vec<Note> = sqlx::query_as(
            r#"
            SELECT n.* FROM notes n
            JOIN pets p ON p.id = n.pet_id
            WHERE p.family_id = $1
            ORDER BY n.date DESC, n.id
            LIMIT $2
            "#,
        )
        .bind(family_id)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;
        let authors = self
            .user_infos(notes.iter().map(|n| n.author_id).collect())
            .await?;
        let pets = self.pets_by_id(notes.iter().map(|n| n.pet_id).collect()).await?;
        notes
            .into_iter()
            .map(|note| -> StoreResult<NoteWithAuthorAndPet> {
                let author = lookup(&authors, note.author_id, "author")?;
                let pet = lookup(&pets, note.pet_id, "pet")?;
                Ok(NoteWithAuthorAndPet { note, author, pet })
            })
            .collect()
    }

    async fn create_pet_file(&self, file: PetFile) -> StoreResult<PetFile> {
        sqlx::query(
            r#"
            INSERT INTO pet_files (
                id, pet_id, uploader_id, file_name, file_type, file_size, file_path,
                description, category, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(file.id)
        .bind(file.pet_id)
        .bind(file.uploader_id)
        .bind(&file.file_name)
        .bind(&file.file_type)
        .bind(file.file_size)
        .bind(&file.file_path)
        .bind(&file.description)
        .bind(&file.category)
        .bind(file.created_at)
        .execute(&self.pool)
        .await?;
        Ok(file)
    }

    async fn get_pet_file(&self, id: Uuid) -> StoreResult<Option<PetFile>> {
        Ok(sqlx::query_as("SELECT * FROM pet_files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_pet_files(&self, pet_id: Uuid) -> StoreResult<Vec<PetFile>> {
        Ok(
            sqlx::query_as("SELECT * FROM pet_files WHERE pet_id = $1 ORDER BY created_at DESC, id")
                .bind(pet_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn delete_pet_file(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM pet_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_vaccination(&self, vaccination: Vaccination) -> StoreResult<Vaccination> {
        sqlx::query(
            r#"
            INSERT INTO vaccinations (
                id, pet_id, vaccine_name, date_administered, next_due_date, vet_name,
                vet_clinic, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(vaccination.id)
        .bind(vaccination.pet_id)
        .bind(&vaccination.vaccine_name)
        .bind(vaccination.date_administered)
        .bind(vaccination.next_due_date)
        .bind(&vaccination.vet_name)
        .bind(&vaccination.vet_clinic)
        .bind(&vaccination.notes)
        .bind(vaccination.created_at)
        .execute(&self.pool)
        .await?;
        Ok(vaccination)
    }

    async fn get_vaccination(&self, id: Uuid) -> StoreResult<Option<Vaccination>> {
        Ok(sqlx::query_as("SELECT * FROM vaccinations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_vaccination(&self, vaccination: Vaccination) -> StoreResult<Vaccination> {
        let updated = sqlx::query(
            r#"
            UPDATE vaccinations SET
                vaccine_name = $2, date_administered = $3, next_due_date = $4,
                vet_name = $5, vet_clinic = $6, notes = $7
            WHERE id = $1
            "#,
        )
        .bind(vaccination.id)
        .bind(&vaccination.vaccine_name)
        .bind(vaccination.date_administered)
        .bind(vaccination.next_due_date)
        .bind(&vaccination.vet_name)
        .bind(&vaccination.vet_clinic)
        .bind(&vaccination.notes)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("vaccination {}", vaccination.id)));
        }
        Ok(vaccination)
    }

    async fn delete_vaccination(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM vaccinations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_pet_vaccinations(&self, pet_id: Uuid) -> StoreResult<Vec<Vaccination>> {
        Ok(sqlx::query_as(
            "SELECT * FROM vaccinations WHERE pet_id = $1 ORDER BY date_administered DESC, id",
        )
        .bind(pet_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn upcoming_vaccinations(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<VaccinationWithPet>> {
        let items: Vec<Vaccination> = sqlx::query_as(
            r#"
            SELECT v.* FROM vaccinations v
            JOIN pets p ON p.id = v.pet_id
            WHERE p.family_id = $1 AND v.next_due_date > $2
            ORDER BY v.next_due_date, v.id
            "#,
        )
        .bind(family_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        let pets = self.pets_by_id(items.iter().map(|v| v.pet_id).collect()).await?;
        items
            .into_iter()
            .map(|vaccination| -> StoreResult<VaccinationWithPet> {
                let pet = lookup(&pets, vaccination.pet_id, "pet")?;
                Ok(VaccinationWithPet { vaccination, pet })
            })
            .collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
