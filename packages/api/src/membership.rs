//! # Family membership authority
//!
//! Owns the identity↔family relation and the rules around it:
//!
//! - A new family always starts with its creator as `admin` (the store does both
//!   writes atomically).
//! - An identity may hold memberships in any number of families, at most one each.
//! - An admin cannot leave, or be demoted, while they are the family's last admin
//!   and other members remain.
//!
//! Every family-scoped handler goes through [`require_member`] (or
//! [`require_admin`]). Resource handlers that start from a pet use
//! [`pet_for_member`], which loads the pet and checks its owning family.

use store::models::{
    Family, FamilyMember, FamilyRole, MembershipWithFamily, NewFamily, Pet, User,
};
use store::Storage;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::FamilyWithMembers;

/// The caller's membership in `family_id`, or `Unauthorized`.
pub async fn require_member(
    store: &dyn Storage,
    family_id: Uuid,
    user_id: Uuid,
) -> ApiResult<FamilyMember> {
    store
        .get_membership(family_id, user_id)
        .await?
        .ok_or_else(ApiError::not_a_member)
}

pub async fn require_admin(
    store: &dyn Storage,
    family_id: Uuid,
    user_id: Uuid,
) -> ApiResult<FamilyMember> {
    let member = require_member(store, family_id, user_id).await?;
    if !member.is_admin() {
        return Err(ApiError::Unauthorized("admin role required".into()));
    }
    Ok(member)
}

/// Like [`require_member`], but 404 when the family itself does not exist.
pub async fn existing_family_for_member(
    store: &dyn Storage,
    family_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Family> {
    let family = store
        .get_family(family_id)
        .await?
        .ok_or_else(|| ApiError::not_found("family"))?;
    require_member(store, family_id, user_id).await?;
    Ok(family)
}

/// Load a pet and check the caller belongs to its family.
pub async fn pet_for_member(store: &dyn Storage, pet_id: Uuid, user_id: Uuid) -> ApiResult<Pet> {
    let pet = store
        .get_pet(pet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("pet"))?;
    require_member(store, pet.family_id, user_id).await?;
    Ok(pet)
}

pub async fn create_family(store: &dyn Storage, family: NewFamily, creator: &User) -> ApiResult<Family> {
    let name = family.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("family name is required"));
    }
    let family = store
        .create_family(
            NewFamily {
                name,
                description: family.description,
            },
            creator.id,
        )
        .await?;
    tracing::info!(family_id = %family.id, creator = %creator.id, "family created");
    Ok(family)
}

pub async fn list_families_for(
    store: &dyn Storage,
    user_id: Uuid,
) -> ApiResult<Vec<MembershipWithFamily>> {
    Ok(store.list_user_families(user_id).await?)
}

pub async fn family_with_members(store: &dyn Storage, family_id: Uuid) -> ApiResult<FamilyWithMembers> {
    let family = store
        .get_family(family_id)
        .await?
        .ok_or_else(|| ApiError::not_found("family"))?;
    let members = store.list_family_members(family_id).await?;
    Ok(FamilyWithMembers { family, members })
}

pub async fn add_member(
    store: &dyn Storage,
    family_id: Uuid,
    user_id: Uuid,
    role: FamilyRole,
) -> ApiResult<FamilyMember> {
    let member = store.add_family_member(family_id, user_id, role).await?;
    tracing::info!(%family_id, %user_id, %role, "member added");
    Ok(member)
}

/// Unconditional removal, used for admin-initiated removals.
pub async fn remove_member(store: &dyn Storage, family_id: Uuid, user_id: Uuid) -> ApiResult<()> {
    store.remove_family_member(family_id, user_id).await?;
    tracing::info!(%family_id, %user_id, "member removed");
    Ok(())
}

pub async fn leave_family(store: &dyn Storage, family_id: Uuid, caller: Uuid) -> ApiResult<()> {
    let membership = store
        .get_membership(family_id, caller)
        .await?
        .ok_or_else(|| ApiError::NotFound("not a member of this family".into()))?;
    if membership.is_admin() && store.count_family_members(family_id).await? > 1 {
        return Err(ApiError::AdminMustTransfer);
    }
    store.remove_family_member(family_id, caller).await?;
    tracing::info!(%family_id, user_id = %caller, "member left family");
    Ok(())
}

pub async fn update_member_role(
    store: &dyn Storage,
    family_id: Uuid,
    user_id: Uuid,
    role: FamilyRole,
) -> ApiResult<FamilyMember> {
    let current = store
        .get_membership(family_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("membership"))?;
    if current.is_admin() && role == FamilyRole::Member {
        let members = store.list_family_members(family_id).await?;
        let admins = members.iter().filter(|m| m.member.is_admin()).count();
        if admins == 1 && members.len() > 1 {
            return Err(ApiError::validation(
                "a family with other members must keep at least one admin",
            ));
        }
    }
    Ok(store.update_family_member_role(family_id, user_id, role).await?)
}

pub async fn delete_family(store: &dyn Storage, family_id: Uuid) -> ApiResult<()> {
    store.delete_family(family_id).await?;
    tracing::info!(%family_id, "family deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use store::models::NewLocalUser;
    use store::MemoryStore;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_local_user(NewLocalUser {
                email: email.into(),
                password_hash: "hash".into(),
                first_name: "Test".into(),
                last_name: "User".into(),
            })
            .await
            .unwrap()
    }

    async fn family_of(store: &MemoryStore, admin: &User) -> Family {
        let new = NewFamily {
            name: "Smiths".into(),
            description: None,
        };
        create_family(store, new, admin).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_family_requires_name() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let err = create_family(&store, NewFamily::default(), &ada).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_cannot_leave_while_others_remain() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let family = family_of(&store, &ada).await;
        add_member(&store, family.id, bob.id, FamilyRole::Member).await.unwrap();

        let err = leave_family(&store, family.id, ada.id).await.unwrap_err();
        assert!(matches!(err, ApiError::AdminMustTransfer));

        leave_family(&store, family.id, bob.id).await.unwrap();
        // Alone now, the admin may leave and the family is emptied.
        leave_family(&store, family.id, ada.id).await.unwrap();
        assert_eq!(store.count_family_members(family.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_leave_when_not_member() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let family = family_of(&store, &ada).await;
        let err = leave_family(&store, family.id, bob.id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_guards() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let family = family_of(&store, &ada).await;

        assert!(require_admin(&store, family.id, ada.id).await.is_ok());
        assert_eq!(
            require_member(&store, family.id, bob.id).await.unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );
        add_member(&store, family.id, bob.id, FamilyRole::Member).await.unwrap();
        assert!(require_member(&store, family.id, bob.id).await.is_ok());
        assert!(require_admin(&store, family.id, bob.id).await.is_err());

        let dup = add_member(&store, family.id, bob.id, FamilyRole::Member).await.unwrap_err();
        assert_eq!(dup.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_last_admin_cannot_be_demoted() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let family = family_of(&store, &ada).await;
        add_member(&store, family.id, bob.id, FamilyRole::Member).await.unwrap();

        let err = update_member_role(&store, family.id, ada.id, FamilyRole::Member)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        update_member_role(&store, family.id, bob.id, FamilyRole::Admin).await.unwrap();
        let ada_now = update_member_role(&store, family.id, ada.id, FamilyRole::Member)
            .await
            .unwrap();
        assert_eq!(ada_now.role, FamilyRole::Member);
    }

    #[tokio::test]
    async fn test_family_with_members() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let family = family_of(&store, &ada).await;
        let view = family_with_members(&store, family.id).await.unwrap();
        assert_eq!(view.members.len(), 1);
        assert_eq!(view.members[0].member.role, FamilyRole::Admin);
        assert!(family_with_members(&store, Uuid::new_v4()).await.is_err());
    }
}
