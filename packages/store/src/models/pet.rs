//! Pets, owned by exactly one family.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    /// "dog", "cat", "bird", ...
    pub species: String,
    pub breed: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub weight: Option<String>,
    pub color: Option<String>,
    pub microchip: Option<String>,
    pub description: Option<String>,
    pub profile_image_url: Option<String>,
    pub vet_name: Option<String>,
    pub vet_clinic: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    pub family_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    pub breed: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub weight: Option<String>,
    pub color: Option<String>,
    pub microchip: Option<String>,
    pub description: Option<String>,
    pub profile_image_url: Option<String>,
    pub vet_name: Option<String>,
    pub vet_clinic: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub location: Option<String>,
}

/// Partial update: every present field overwrites the stored one, and an explicit
/// `null` clears an optional field. The owning family cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPatch {
    pub name: Option<String>,
    pub species: Option<String>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub breed: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub birth_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub weight: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub microchip: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub profile_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vet_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vet_clinic: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub allergies: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub medications: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub location: Option<Option<String>>,
}

impl Pet {
    /// Build a fresh record from creation input.
    pub fn create(new: NewPet, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            family_id: new.family_id,
            name: new.name,
            species: new.species,
            breed: new.breed,
            gender: new.gender,
            birth_date: new.birth_date,
            weight: new.weight,
            color: new.color,
            microchip: new.microchip,
            description: new.description,
            profile_image_url: new.profile_image_url,
            vet_name: new.vet_name,
            vet_clinic: new.vet_clinic,
            allergies: new.allergies,
            medications: new.medications,
            location: new.location,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: PetPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(species) = patch.species {
            self.species = species;
        }
        overwrite(&mut self.breed, patch.breed);
        overwrite(&mut self.gender, patch.gender);
        overwrite(&mut self.birth_date, patch.birth_date);
        overwrite(&mut self.weight, patch.weight);
        overwrite(&mut self.color, patch.color);
        overwrite(&mut self.microchip, patch.microchip);
        overwrite(&mut self.description, patch.description);
        overwrite(&mut self.profile_image_url, patch.profile_image_url);
        overwrite(&mut self.vet_name, patch.vet_name);
        overwrite(&mut self.vet_clinic, patch.vet_clinic);
        overwrite(&mut self.allergies, patch.allergies);
        overwrite(&mut self.medications, patch.medications);
        overwrite(&mut self.location, patch.location);
    }
}

/// Apply a nullable patch field: `None` keeps, `Some(value)` replaces (possibly with `None`).
pub(crate) fn overwrite<T>(slot: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keeps_absent_fields() {
        let mut pet = Pet::create(
            NewPet {
                family_id: Uuid::new_v4(),
                name: "Rex".to_string(),
                species: "dog".to_string(),
                breed: Some("beagle".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        pet.apply(PetPatch {
            name: Some("Rexy".to_string()),
            color: Some(Some("brown".to_string())),
            ..Default::default()
        });
        assert_eq!(pet.name, "Rexy");
        assert_eq!(pet.species, "dog");
        assert_eq!(pet.breed.as_deref(), Some("beagle"));
        assert_eq!(pet.color.as_deref(), Some("brown"));
    }

    #[test]
    fn test_patch_null_clears_optional_field() {
        let mut pet = Pet::create(
            NewPet {
                family_id: Uuid::new_v4(),
                name: "Rex".to_string(),
                species: "dog".to_string(),
                microchip: Some("985112".to_string()),
                allergies: Some("pollen".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        let patch: PetPatch = serde_json::from_str(r#"{"microchip": null}"#).unwrap();
        pet.apply(patch);
        assert!(pet.microchip.is_none());
        assert_eq!(pet.allergies.as_deref(), Some("pollen"));
    }
}
