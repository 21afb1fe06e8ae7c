//! Route handlers, one module per resource.

pub mod families;
pub mod files;
pub mod health;
pub mod notes;
pub mod objects;
pub mod pets;
pub mod sharing;
pub mod vaccinations;

use chrono::Utc;

/// `Some(trimmed)` for a non-blank string.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}
