//! # Identities
//!
//! [`User`] is the complete stored identity, including the Argon2 password hash
//! for local accounts. It never leaves the server as-is: [`User::to_info`] projects
//! it into [`UserInfo`], the view sent to clients and embedded in joined records.
//!
//! Local accounts carry `provider = "local"` and no `provider_subject`. Federated
//! accounts carry the provider name (`"google"`, `"github"`) and the subject the
//! provider asserted; the pair is unique and is the upsert key for
//! [`FederatedProfile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider name recorded for email + password accounts.
pub const LOCAL_PROVIDER: &str = "local";

/// Full identity record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub password_hash: Option<String>,
    pub provider: String,
    pub provider_subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Project to the client-safe view.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_image_url: self.profile_image_url.clone(),
            provider: self.provider.clone(),
        }
    }
}

/// Identity view safe to send to the client (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub provider: String,
}

impl UserInfo {
    /// "First Last", falling back to the email, then to the id.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
        self.email.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Input for a local (email + password) registration. The email is expected to
/// be normalised and the password already hashed.
#[derive(Debug, Clone)]
pub struct NewLocalUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Claims asserted by a federated login, kept in the session and upserted into
/// a [`User`] on each resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederatedProfile {
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(first: Option<&str>, last: Option<&str>, email: Option<&str>) -> UserInfo {
        UserInfo {
            id: Uuid::nil(),
            email: email.map(str::to_string),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            profile_image_url: None,
            provider: LOCAL_PROVIDER.to_string(),
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(info(Some("Ada"), Some("Lovelace"), None).display_name(), "Ada Lovelace");
        assert_eq!(info(Some("Ada"), None, None).display_name(), "Ada");
        assert_eq!(info(None, None, Some("ada@example.com")).display_name(), "ada@example.com");
        assert_eq!(info(None, None, None).display_name(), Uuid::nil().to_string());
    }

    #[test]
    fn test_info_serializes_camel_case() {
        let json = serde_json::to_value(info(Some("Ada"), Some("L"), Some("a@b.c"))).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["profileImageUrl"], serde_json::Value::Null);
        assert!(json.get("passwordHash").is_none());
    }
}
