//! Family and membership endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use store::models::{Family, FamilyMember, FamilyRole, MembershipWithFamily, NewFamily};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::membership;
use crate::models::FamilyWithMembers;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: Option<FamilyRole>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: FamilyRole,
}

pub async fn create_family(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewFamily>,
) -> ApiResult<(StatusCode, Json<Family>)> {
    let family = membership::create_family(state.store.as_ref(), body, &user).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

pub async fn list_families(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<MembershipWithFamily>>> {
    Ok(Json(membership::list_families_for(state.store.as_ref(), user.id).await?))
}

pub async fn get_family(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FamilyWithMembers>> {
    membership::existing_family_for_member(state.store.as_ref(), id, user.id).await?;
    Ok(Json(membership::family_with_members(state.store.as_ref(), id).await?))
}

pub async fn delete_family(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, id, user.id).await?;
    membership::require_admin(store, id, user.id).await?;
    membership::delete_family(store, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admins may add anyone with any role. A non-admin may only add themself as
/// a plain member, which is how a scanned invite joins a family.
pub async fn add_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<FamilyMember>)> {
    let store = state.store.as_ref();
    if store.get_family(id).await?.is_none() {
        return Err(ApiError::not_found("family"));
    }
    let role = body.role.unwrap_or_default();
    let self_join = body.user_id == user.id && role == FamilyRole::Member;
    if !self_join {
        membership::require_admin(store, id, user.id).await?;
    }
    let member = membership::add_member(store, id, body.user_id, role).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMemberRequest>,
) -> ApiResult<Json<FamilyMember>> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, id, user.id).await?;
    membership::require_admin(store, id, user.id).await?;
    Ok(Json(membership::update_member_role(store, id, user_id, body.role).await?))
}

pub async fn leave_family(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    membership::leave_family(state.store.as_ref(), id, user.id).await?;
    Ok(Json(json!({ "message": "left family" })))
}

/// Removing someone else needs admin; removing yourself follows the leave rules.
pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let store = state.store.as_ref();
    if user_id == user.id {
        membership::leave_family(store, id, user.id).await?;
    } else {
        membership::require_admin(store, id, user.id).await?;
        membership::remove_member(store, id, user_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
