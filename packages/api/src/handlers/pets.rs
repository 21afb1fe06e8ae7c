use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use store::models::{NewPet, Pet, PetPatch};
use uuid::Uuid;

use super::objects::{discard_object, normalize_object_path};
use super::{non_blank, now};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::membership;

#[derive(Debug, Deserialize)]
pub struct SetImageRequest {
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetImageResponse {
    pub pet: Pet,
    #[serde(rename = "objectPath")]
    pub object_path: String,
}

pub async fn create_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut body): Json<NewPet>,
) -> ApiResult<(StatusCode, Json<Pet>)> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, body.family_id, user.id).await?;
    body.name = non_blank(&body.name).ok_or_else(|| ApiError::validation("pet name is required"))?;
    body.species =
        non_blank(&body.species).ok_or_else(|| ApiError::validation("pet species is required"))?;
    if let Some(url) = body.profile_image_url.take() {
        body.profile_image_url = Some(normalize_object_path(&url));
    }
    let pet = store.create_pet(Pet::create(body, now())).await?;
    tracing::info!(pet_id = %pet.id, family_id = %pet.family_id, "pet created");
    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn get_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Pet>> {
    Ok(Json(membership::pet_for_member(state.store.as_ref(), id, user.id).await?))
}

pub async fn list_family_pets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Pet>>> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, id, user.id).await?;
    Ok(Json(store.list_family_pets(id).await?))
}

pub async fn update_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<PetPatch>,
) -> ApiResult<Json<Pet>> {
    let store = state.store.as_ref();
    let mut pet = membership::pet_for_member(store, id, user.id).await?;
    if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::validation("pet name cannot be blank"));
    }
    pet.apply(patch);
    pet.updated_at = now();
    Ok(Json(store.update_pet(pet).await?))
}

/// Deletes the pet and, through the store cascade, its notes, files and
/// vaccinations. Stored file objects are removed afterwards.
pub async fn delete_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, id, user.id).await?;
    let files = store.list_pet_files(id).await?;
    store.delete_pet(id).await?;
    for file in &files {
        discard_object(&state, &file.file_path).await;
    }
    tracing::info!(pet_id = %id, files = files.len(), "pet deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_pet_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetImageRequest>,
) -> ApiResult<Json<SetImageResponse>> {
    let store = state.store.as_ref();
    let raw = body
        .image_url
        .as_deref()
        .and_then(non_blank)
        .ok_or_else(|| ApiError::validation("imageURL is required"))?;
    let mut pet = membership::pet_for_member(store, id, user.id).await?;
    let object_path = normalize_object_path(&raw);
    pet.profile_image_url = Some(object_path.clone());
    pet.updated_at = now();
    let pet = store.update_pet(pet).await?;
    Ok(Json(SetImageResponse { pet, object_path }))
}
