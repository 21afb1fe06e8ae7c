//! # Pet notes
//!
//! A [`Note`] is one of three kinds, selected by [`NoteType`]:
//!
//! | Type | Meaningful extra fields |
//! |------|-------------------------|
//! | `daily` | `mood` |
//! | `veterinary` | `vetName`, `vetClinic`, `medications`, `vaccinations` |
//! | `task` | `dueDate`, `frequency` (default `once`), `completed` |
//!
//! The columns exist for every note; [`Note::normalize`] blanks the ones that do not
//! belong to the note's type so stored rows only carry meaningful values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pet::{overwrite, Pet};
use super::user::UserInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Daily,
    Veterinary,
    Task,
}

super::text_enum!(NoteType, "note type", {
    Daily => "daily",
    Veterinary => "veterinary",
    Task => "task",
});

/// Mood of a daily note. The wire and column values are the ones the web client
/// has always used; English spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    #[serde(rename = "muy_feliz", alias = "very_happy")]
    VeryHappy,
    #[serde(rename = "feliz", alias = "happy")]
    Happy,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "triste", alias = "sad")]
    Sad,
    #[serde(rename = "enfermo", alias = "unwell")]
    Unwell,
}

super::text_enum!(Mood, "mood", {
    VeryHappy => "muy_feliz",
    Happy => "feliz",
    Normal => "normal",
    Sad => "triste",
    Unwell => "enfermo",
});

/// Recurrence of a task note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

super::text_enum!(Frequency, "frequency", {
    Once => "once",
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub author_id: Uuid,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub frequency: Option<Frequency>,
    pub completed: bool,
    pub vet_name: Option<String>,
    pub vet_clinic: Option<String>,
    pub medications: Option<String>,
    pub vaccinations: Option<String>,
    pub mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a note. `author_id` is never read from the request body;
/// the API sets it to the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub pet_id: Uuid,
    #[serde(skip_deserializing)]
    pub author_id: Uuid,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub frequency: Option<Frequency>,
    pub completed: Option<bool>,
    pub vet_name: Option<String>,
    pub vet_clinic: Option<String>,
    pub medications: Option<String>,
    pub vaccinations: Option<String>,
    pub mood: Option<Mood>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(rename = "type")]
    pub note_type: Option<NoteType>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub frequency: Option<Option<Frequency>>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vet_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vet_clinic: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub medications: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub vaccinations: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub mood: Option<Option<Mood>>,
}

impl Note {
    /// Build a fresh, normalised record. A missing `date` defaults to `now`.
    pub fn create(new: NewNote, now: DateTime<Utc>) -> Self {
        let mut note = Self {
            id: Uuid::new_v4(),
            pet_id: new.pet_id,
            author_id: new.author_id,
            note_type: new.note_type,
            title: new.title,
            content: new.content,
            date: new.date.unwrap_or(now),
            due_date: new.due_date,
            frequency: new.frequency,
            completed: new.completed.unwrap_or(false),
            vet_name: new.vet_name,
            vet_clinic: new.vet_clinic,
            medications: new.medications,
            vaccinations: new.vaccinations,
            mood: new.mood,
            created_at: now,
            updated_at: now,
        };
        note.normalize();
        note
    }

    /// Apply a partial update, then re-normalise for the (possibly new) type.
    pub fn apply(&mut self, patch: NotePatch) {
        if let Some(note_type) = patch.note_type {
            self.note_type = note_type;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        overwrite(&mut self.due_date, patch.due_date);
        overwrite(&mut self.frequency, patch.frequency);
        overwrite(&mut self.vet_name, patch.vet_name);
        overwrite(&mut self.vet_clinic, patch.vet_clinic);
        overwrite(&mut self.medications, patch.medications);
        overwrite(&mut self.vaccinations, patch.vaccinations);
        overwrite(&mut self.mood, patch.mood);
        self.normalize();
    }

    /// Blank every type-specific field that does not belong to `note_type`.
    pub fn normalize(&mut self) {
        if self.note_type != NoteType::Veterinary {
            self.vet_name = None;
            self.vet_clinic = None;
            self.medications = None;
            self.vaccinations = None;
        }
        if self.note_type != NoteType::Daily {
            self.mood = None;
        }
        if self.note_type == NoteType::Task {
            self.frequency.get_or_insert(Frequency::Once);
        } else {
            self.due_date = None;
            self.frequency = None;
            self.completed = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithAuthor {
    #[serde(flatten)]
    pub note: Note,
    pub author: UserInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithAuthorAndPet {
    #[serde(flatten)]
    pub note: Note,
    pub author: UserInfo,
    pub pet: Pet,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note(note_type: NoteType) -> NewNote {
        NewNote {
            pet_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            note_type,
            title: "Checkup".to_string(),
            content: "All good".to_string(),
            date: None,
            due_date: Some(Utc::now()),
            frequency: Some(Frequency::Weekly),
            completed: Some(true),
            vet_name: Some("Dr. Vega".to_string()),
            vet_clinic: Some("Central".to_string()),
            medications: None,
            vaccinations: None,
            mood: Some(Mood::Happy),
        }
    }

    #[test]
    fn test_daily_note_keeps_only_mood() {
        let note = Note::create(new_note(NoteType::Daily), Utc::now());
        assert_eq!(note.mood, Some(Mood::Happy));
        assert!(note.vet_name.is_none());
        assert!(note.due_date.is_none());
        assert!(note.frequency.is_none());
        assert!(!note.completed);
    }

    #[test]
    fn test_veterinary_note_keeps_vet_fields() {
        let note = Note::create(new_note(NoteType::Veterinary), Utc::now());
        assert_eq!(note.vet_name.as_deref(), Some("Dr. Vega"));
        assert!(note.mood.is_none());
        assert!(note.frequency.is_none());
    }

    #[test]
    fn test_task_defaults_frequency_and_switching_type_clears() {
        let mut new = new_note(NoteType::Task);
        new.frequency = None;
        let mut note = Note::create(new, Utc::now());
        assert_eq!(note.frequency, Some(Frequency::Once));
        assert!(note.completed);

        note.apply(NotePatch {
            note_type: Some(NoteType::Daily),
            mood: Some(Some(Mood::Sad)),
            ..Default::default()
        });
        assert_eq!(note.note_type, NoteType::Daily);
        assert_eq!(note.mood, Some(Mood::Sad));
        assert!(note.frequency.is_none());
        assert!(!note.completed);
    }

    #[test]
    fn test_patch_null_clears_and_absent_keeps() {
        let mut note = Note::create(new_note(NoteType::Veterinary), Utc::now());
        let patch: NotePatch =
            serde_json::from_str(r#"{"vetName": null, "content": "checkup"}"#).unwrap();
        note.apply(patch);
        assert!(note.vet_name.is_none());
        assert_eq!(note.vet_clinic.as_deref(), Some("Central"));
        assert_eq!(note.content, "checkup");
    }

    #[test]
    fn test_mood_round_trips_client_values() {
        let mood: Mood = serde_json::from_str("\"muy_feliz\"").unwrap();
        assert_eq!(mood, Mood::VeryHappy);
        assert_eq!(serde_json::to_string(&Mood::Sad).unwrap(), "\"triste\"");
        let english: Mood = serde_json::from_str("\"unwell\"").unwrap();
        assert_eq!(english, Mood::Unwell);
        assert_eq!("enfermo".parse::<Mood>().unwrap(), Mood::Unwell);
        let note_type: NoteType = serde_json::from_str("\"veterinary\"").unwrap();
        assert_eq!(note_type, NoteType::Veterinary);
    }
}
