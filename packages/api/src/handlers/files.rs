use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use store::models::{NewPetFile, PetFile};
use uuid::Uuid;

use super::objects::{discard_object, normalize_object_path};
use super::{non_blank, now};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::membership;

async fn file_for_member(state: &AppState, id: Uuid, user_id: Uuid) -> ApiResult<PetFile> {
    let store = state.store.as_ref();
    let file = store
        .get_pet_file(id)
        .await?
        .ok_or_else(|| ApiError::not_found("file"))?;
    membership::pet_for_member(store, file.pet_id, user_id).await?;
    Ok(file)
}

pub async fn create_pet_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut body): Json<NewPetFile>,
) -> ApiResult<(StatusCode, Json<PetFile>)> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, body.pet_id, user.id).await?;
    body.file_name =
        non_blank(&body.file_name).ok_or_else(|| ApiError::validation("fileName is required"))?;
    let path =
        non_blank(&body.file_path).ok_or_else(|| ApiError::validation("filePath is required"))?;
    body.file_path = normalize_object_path(&path);
    if body.file_type.trim().is_empty() {
        body.file_type = "application/octet-stream".to_string();
    }
    body.uploader_id = user.id;
    let file = store.create_pet_file(PetFile::create(body, now())).await?;
    tracing::info!(file_id = %file.id, pet_id = %file.pet_id, "pet file recorded");
    Ok((StatusCode::CREATED, Json(file)))
}

pub async fn get_pet_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PetFile>> {
    Ok(Json(file_for_member(&state, id, user.id).await?))
}

pub async fn list_pet_files(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PetFile>>> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, id, user.id).await?;
    Ok(Json(store.list_pet_files(id).await?))
}

pub async fn delete_pet_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let file = file_for_member(&state, id, user.id).await?;
    state.store.delete_pet_file(id).await?;
    discard_object(&state, &file.file_path).await;
    Ok(StatusCode::NO_CONTENT)
}
