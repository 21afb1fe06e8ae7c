//! Server-local object uploads and downloads.
//!
//! Clients first ask for an [`UploadTicket`], `PUT` the bytes to its upload URL,
//! then reference the returned `objectPath` from a pet file or profile image.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::models::UploadTicket;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Turn an upload URL (absolute or relative) into the `/objects/...` path it
/// is served from. Anything that does not point at the upload endpoint or the
/// object store is returned unchanged.
pub fn normalize_object_path(raw: &str) -> String {
    let path = match raw.find("://") {
        Some(scheme_end) => {
            let rest = &raw[scheme_end + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => return raw.to_string(),
            }
        }
        None => raw,
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if let Some(key) = path.strip_prefix("/api/objects/") {
        format!("/objects/{key}")
    } else if path.starts_with("/objects/") {
        path.to_string()
    } else {
        raw.to_string()
    }
}

pub async fn request_upload(CurrentUser(_user): CurrentUser) -> Json<UploadTicket> {
    let id = Uuid::new_v4();
    Json(UploadTicket {
        upload_url: format!("/api/objects/uploads/{id}"),
        object_path: format!("/objects/uploads/{id}"),
    })
}

pub async fn put_upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let key = format!("uploads/{id}");
    state.objects.put(&key, content_type, body.to_vec()).await?;
    tracing::info!(%key, user_id = %user.id, size = body.len(), "object uploaded");
    Ok(Json(json!({ "objectPath": format!("/objects/{key}") })))
}

pub async fn serve_object(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let object = state
        .objects
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::not_found("object"))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, object.content_type)],
        Body::from(object.data),
    )
        .into_response())
}

/// Best-effort removal of a stored object referenced by `file_path`.
pub(crate) async fn discard_object(state: &AppState, file_path: &str) {
    let Some(key) = file_path.strip_prefix("/objects/") else {
        return;
    };
    if let Err(err) = state.objects.delete(key).await {
        tracing::warn!(%key, error = %err, "failed to delete stored object");
    }
}
