//! Families and their membership roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserInfo;

/// A named group owning pets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a family.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamily {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

/// Role of an identity inside a family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
    Admin,
    #[default]
    Member,
}

super::text_enum!(FamilyRole, "family role", {
    Admin => "admin",
    Member => "member",
});

/// The (family, identity, role) relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub role: FamilyRole,
    pub joined_at: DateTime<Utc>,
}

impl FamilyMember {
    pub fn is_admin(&self) -> bool {
        self.role == FamilyRole::Admin
    }
}

/// A membership of the caller paired with its family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipWithFamily {
    #[serde(flatten)]
    pub member: FamilyMember,
    pub family: Family,
}

/// A membership of a family paired with the member's identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: FamilyMember,
    pub user: UserInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_text_roundtrip() {
        assert_eq!("admin".parse::<FamilyRole>().unwrap(), FamilyRole::Admin);
        assert_eq!(FamilyRole::Member.as_str(), "member");
        assert_eq!(FamilyRole::default(), FamilyRole::Member);
        let err = "owner".parse::<FamilyRole>().unwrap_err();
        assert_eq!(err.value, "owner");
    }

    #[test]
    fn test_membership_with_family_flattens() {
        let now = Utc::now();
        let family = Family {
            id: Uuid::new_v4(),
            name: "Smiths".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        let member = FamilyMember {
            id: Uuid::new_v4(),
            family_id: family.id,
            user_id: Uuid::new_v4(),
            role: FamilyRole::Admin,
            joined_at: now,
        };
        let json = serde_json::to_value(MembershipWithFamily { member, family }).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["family"]["name"], "Smiths");
        assert!(json.get("familyId").is_some());
    }
}
