//! Authentication endpoints: local registration and login, logout, the current
//! identity, and the OAuth redirect/callback pair.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use store::models::{NewLocalUser, UserInfo};
use store::StoreError;
use tower_sessions::Session;

use super::password::{hash_password_blocking, verify_password_blocking};
use super::resolver::CurrentUser;
use super::session::{self, PendingOAuth, PENDING_OAUTH_KEY};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Trimmed, non-empty value or `None`.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserInfo>)> {
    let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
        present(body.email),
        body.password.filter(|p| !p.is_empty()),
        present(body.first_name),
        present(body.last_name),
    ) else {
        return Err(ApiError::validation("email, password, firstName and lastName are required"));
    };
    let email = normalize_email(&email);
    if !email.contains('@') {
        return Err(ApiError::validation("invalid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let password_hash = hash_password_blocking(password)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    let user = state
        .store
        .create_local_user(NewLocalUser {
            email,
            password_hash,
            first_name,
            last_name,
        })
        .await
        .map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::EmailTaken,
            other => other.into(),
        })?;

    session::sign_in_local(&session, user.id).await?;
    tracing::info!(user_id = %user.id, "registered local user");
    Ok((StatusCode::CREATED, Json(user.to_info())))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<UserInfo>> {
    let (Some(email), Some(password)) = (present(body.email), body.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::validation("email and password are required"));
    };

    let user = state
        .store
        .get_user_by_email(&normalize_email(&email))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    let hash = user.password_hash.clone().ok_or(ApiError::InvalidCredentials)?;
    let valid = verify_password_blocking(password, hash)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    session::sign_in_local(&session, user.id).await?;
    tracing::info!(user_id = %user.id, "local login");
    Ok(Json(user.to_info()))
}

pub async fn logout(session: Session) -> ApiResult<Json<Value>> {
    session.flush().await?;
    Ok(Json(json!({ "message": "logged out" })))
}

/// Browser-facing logout: clears the session and goes home.
pub async fn logout_redirect(session: Session) -> ApiResult<Redirect> {
    session.flush().await?;
    Ok(Redirect::to("/"))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
    Json(user.to_info())
}

pub async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    session: Session,
) -> ApiResult<Redirect> {
    let oauth = state
        .oauth
        .get(&provider)
        .ok_or_else(|| ApiError::not_found("login provider"))?;
    let request = oauth.authorize();
    let pending = PendingOAuth {
        provider: oauth.name().to_string(),
        state: request.state,
        verifier: request.verifier,
    };
    session.insert(PENDING_OAUTH_KEY, pending).await?;
    Ok(Redirect::to(&request.url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn login_error(reason: &str) -> Redirect {
    Redirect::to(&format!("/login?error={reason}"))
}

pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    session: Session,
) -> Redirect {
    if let Some(error) = params.error {
        tracing::warn!(%provider, %error, "provider returned an error");
        return login_error("oauth_denied");
    }
    let Some(oauth) = state.oauth.get(&provider) else {
        return login_error("unknown_provider");
    };
    let (Some(code), Some(returned_state)) = (params.code, params.state) else {
        tracing::error!(%provider, "callback missing code or state");
        return login_error("missing_code");
    };

    let pending = match session.remove::<PendingOAuth>(PENDING_OAUTH_KEY).await {
        Ok(Some(pending)) => pending,
        Ok(None) => return login_error("invalid_state"),
        Err(e) => {
            tracing::error!(error = %e, "failed to read session");
            return login_error("session_error");
        }
    };
    if pending.provider != provider || pending.state != returned_state {
        tracing::warn!(%provider, "OAuth state mismatch");
        return login_error("invalid_state");
    }

    let profile = match oauth.exchange_code(&code, &pending.verifier).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(%provider, error = %e, "OAuth exchange failed");
            return login_error("oauth_error");
        }
    };

    if let Err(e) = session::sign_in_federated(&session, &profile).await {
        tracing::error!(error = %e, "failed to set session");
        return login_error("session_error");
    }
    tracing::info!(%provider, subject = %profile.subject, "federated login");
    Redirect::to("/")
}
