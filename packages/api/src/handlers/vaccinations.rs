use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use store::models::{NewVaccination, Vaccination, VaccinationPatch, VaccinationWithPet};
use uuid::Uuid;

use super::{non_blank, now};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::membership;

async fn vaccination_for_member(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> ApiResult<Vaccination> {
    let store = state.store.as_ref();
    let vaccination = store
        .get_vaccination(id)
        .await?
        .ok_or_else(|| ApiError::not_found("vaccination"))?;
    membership::pet_for_member(store, vaccination.pet_id, user_id).await?;
    Ok(vaccination)
}

pub async fn create_vaccination(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut body): Json<NewVaccination>,
) -> ApiResult<(StatusCode, Json<Vaccination>)> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, body.pet_id, user.id).await?;
    body.vaccine_name = non_blank(&body.vaccine_name)
        .ok_or_else(|| ApiError::validation("vaccineName is required"))?;
    let vaccination = store
        .create_vaccination(Vaccination::create(body, now()))
        .await?;
    Ok((StatusCode::CREATED, Json(vaccination)))
}

pub async fn list_pet_vaccinations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Vaccination>>> {
    let store = state.store.as_ref();
    membership::pet_for_member(store, id, user.id).await?;
    Ok(Json(store.list_pet_vaccinations(id).await?))
}

pub async fn update_vaccination(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<VaccinationPatch>,
) -> ApiResult<Json<Vaccination>> {
    let mut vaccination = vaccination_for_member(&state, id, user.id).await?;
    if patch.vaccine_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::validation("vaccineName cannot be blank"));
    }
    vaccination.apply(patch);
    Ok(Json(state.store.update_vaccination(vaccination).await?))
}

pub async fn delete_vaccination(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    vaccination_for_member(&state, id, user.id).await?;
    state.store.delete_vaccination(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Vaccinations across the family's pets whose next dose is still ahead.
pub async fn upcoming(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<VaccinationWithPet>>> {
    let store = state.store.as_ref();
    membership::existing_family_for_member(store, id, user.id).await?;
    Ok(Json(store.upcoming_vaccinations(id, now()).await?))
}
