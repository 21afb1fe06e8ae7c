//! Public pet projection and family invite codes.

use axum::extract::{Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use qrcode::render::svg;
use qrcode::QrCode;
use uuid::Uuid;

use super::now;
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::membership;
use crate::models::{InviteData, PublicNote, PublicPetProfile, QrInvite, FAMILY_INVITE_TYPE};

const PUBLIC_NOTE_LIMIT: usize = 5;

/// Render `payload` as an SVG QR code wrapped in a base64 data URL.
pub fn qr_data_url(payload: &str) -> anyhow::Result<String> {
    let code = QrCode::new(payload.as_bytes())?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .build();
    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)))
}

pub async fn family_qr(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QrInvite>> {
    let family = membership::existing_family_for_member(state.store.as_ref(), id, user.id).await?;
    let invite_data = InviteData {
        kind: FAMILY_INVITE_TYPE.to_string(),
        family_id: family.id,
        family_name: family.name,
        timestamp: now().timestamp_millis(),
    };
    let payload = serde_json::to_string(&invite_data).map_err(anyhow::Error::from)?;
    let qr_code = qr_data_url(&payload)?;
    Ok(Json(QrInvite {
        qr_code,
        invite_data,
    }))
}

/// Read-only view of a pet for anyone holding its link. No session required.
pub async fn public_pet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PublicPetProfile>> {
    let store = state.store.as_ref();
    let pet = store
        .get_pet(id)
        .await?
        .ok_or_else(|| ApiError::not_found("pet"))?;
    let files = store.list_pet_files(id).await?;
    let notes = store
        .list_pet_notes(id, Some(PUBLIC_NOTE_LIMIT))
        .await?
        .into_iter()
        .map(PublicNote::from)
        .collect();
    let vaccinations = store.list_pet_vaccinations(id).await?;
    Ok(Json(PublicPetProfile {
        pet,
        files,
        notes,
        vaccinations,
    }))
}
