use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use store::models::{NewNote, Note, NotePatch, NoteWithAuthor, NoteWithAuthorAndPet};
use uuid::Uuid;

use super::{non_blank, now};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::membership;

const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Load a note and check the caller belongs to the family owning its pet.
async fn note_for_member(state: &AppState, id: Uuid, user_id: Uuid) -> ApiResult<Note> {
    let store = state.store.as_ref();
    let note = store
        .get_note(id)
        .await?
        .ok_or_else(|| ApiError::not_found("note"))?;
    membership::pet_for_member(store, note.pet_id, user_id).await?;
    Ok(note)
}

pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut body): Json<NewNote>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, body.pet_id, user.id).await?;
    body.title = non_blank(&body.title).ok_or_else(|| ApiError::validation("note title is required"))?;
    body.author_id = user.id;
    let note = store.create_note(Note::create(body, now())).await?;
    tracing::debug!(note_id = %note.id, pet_id = %note.pet_id, note_type = %note.note_type, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Note>> {
    Ok(Json(note_for_member(&state, id, user.id).await?))
}

pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<NotePatch>,
) -> ApiResult<Json<Note>> {
    let mut note = note_for_member(&state, id, user.id).await?;
    if patch.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(ApiError::validation("note title cannot be blank"));
    }
    note.apply(patch);
    note.updated_at = now();
    Ok(Json(state.store.update_note(note).await?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    note_for_member(&state, id, user.id).await?;
    state.store.delete_note(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pet_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<NoteWithAuthor>>> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, id, user.id).await?;
    Ok(Json(store.list_pet_notes(id, None).await?))
}

pub async fn list_family_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<NoteWithAuthorAndPet>>> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, id, user.id).await?;
    Ok(Json(store.list_family_notes(id, None).await?))
}

pub async fn recent_family_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<NoteWithAuthorAndPet>>> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, id, user.id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(store.list_family_notes(id, Some(limit)).await?))
}
