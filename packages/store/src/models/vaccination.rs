//! Vaccination history and due dates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pet::{overwrite, Pet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Vaccination {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub vaccine_name: String,
    pub date_administered: DateTime<Utc>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub vet_name: Option<String>,
    pub vet_clinic: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVaccination {
    pub pet_id: Uuid,
    #[serde(default)]
    pub vaccine_name: String,
    pub date_administered: DateTime<Utc>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub vet_name: Option<String>,
    pub vet_clinic: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationPatch {
    pub vaccine_name: Option<String>,
    pub date_administered: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub next_due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vet_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vet_clinic: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub notes: Option<Option<String>>,
}

impl Vaccination {
    pub fn create(new: NewVaccination, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pet_id: new.pet_id,
            vaccine_name: new.vaccine_name,
            date_administered: new.date_administered,
            next_due_date: new.next_due_date,
            vet_name: new.vet_name,
            vet_clinic: new.vet_clinic,
            notes: new.notes,
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: VaccinationPatch) {
        if let Some(name) = patch.vaccine_name {
            self.vaccine_name = name;
        }
        if let Some(date) = patch.date_administered {
            self.date_administered = date;
        }
        overwrite(&mut self.next_due_date, patch.next_due_date);
        overwrite(&mut self.vet_name, patch.vet_name);
        overwrite(&mut self.vet_clinic, patch.vet_clinic);
        overwrite(&mut self.notes, patch.notes);
    }

    /// Due strictly after `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.next_due_date.is_some_and(|due| due > now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationWithPet {
    #[serde(flatten)]
    pub vaccination: Vaccination,
    pub pet: Pet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_clearing_next_due_date_ends_upcoming() {
        let now = Utc::now();
        let mut vaccination = Vaccination::create(
            NewVaccination {
                pet_id: Uuid::new_v4(),
                vaccine_name: "Rabies".to_string(),
                date_administered: now - Duration::days(10),
                next_due_date: Some(now + Duration::days(355)),
                vet_name: Some("Dr. Vega".to_string()),
                vet_clinic: None,
                notes: None,
            },
            now,
        );
        assert!(vaccination.is_upcoming(now));

        let keep: VaccinationPatch = serde_json::from_str(r#"{"notes": "booster"}"#).unwrap();
        vaccination.apply(keep);
        assert!(vaccination.next_due_date.is_some());
        assert_eq!(vaccination.notes.as_deref(), Some("booster"));

        let clear: VaccinationPatch = serde_json::from_str(r#"{"nextDueDate": null}"#).unwrap();
        vaccination.apply(clear);
        assert!(vaccination.next_due_date.is_none());
        assert_eq!(vaccination.vet_name.as_deref(), Some("Dr. Vega"));
        assert!(!vaccination.is_upcoming(now));
    }
}
