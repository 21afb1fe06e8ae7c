//! # Identity resolution
//!
//! A request's identity comes from one of two places in its session: federated
//! claims written by an OAuth callback, or a local user id written at password
//! login. Each source is a [`ResolveIdentity`] link; [`IdentityResolver`] runs the
//! links in order (federated, then local) and the first [`Resolution::Resolved`]
//! wins. No link resolving is the defined "unauthenticated" outcome, not an error.
//!
//! Handlers take [`CurrentUser`] as an extractor, which rejects with
//! [`ApiError::Unauthenticated`] when nothing resolves.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use store::models::User;
use store::Storage;
use tower_sessions::Session;

use super::session;
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(User),
    Pass,
}

#[async_trait]
pub trait ResolveIdentity: Send + Sync {
    async fn resolve(&self, session: &Session) -> ApiResult<Resolution>;
}

/// Upserts the identity asserted by federated claims, keyed by (provider, subject).
pub struct FederatedResolver {
    store: Arc<dyn Storage>,
}

impl FederatedResolver {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResolveIdentity for FederatedResolver {
    async fn resolve(&self, session: &Session) -> ApiResult<Resolution> {
        let Some(claims) = session::federated_claims(session).await? else {
            return Ok(Resolution::Pass);
        };
        let user = self.store.upsert_federated_user(&claims).await?;
        Ok(Resolution::Resolved(user))
    }
}

/// Loads the local user id stored at login. A dangling id passes.
pub struct LocalResolver {
    store: Arc<dyn Storage>,
}

impl LocalResolver {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResolveIdentity for LocalResolver {
    async fn resolve(&self, session: &Session) -> ApiResult<Resolution> {
        let Some(user_id) = session::local_user_id(session).await? else {
            return Ok(Resolution::Pass);
        };
        match self.store.get_user(user_id).await? {
            Some(user) => Ok(Resolution::Resolved(user)),
            None => {
                tracing::warn!(%user_id, "session refers to a missing user");
                Ok(Resolution::Pass)
            }
        }
    }
}

pub struct IdentityResolver {
    chain: Vec<Box<dyn ResolveIdentity>>,
}

impl IdentityResolver {
    /// The standard chain: federated first, then local.
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self::with_chain(vec![
            Box::new(FederatedResolver::new(store.clone())),
            Box::new(LocalResolver::new(store)),
        ])
    }

    pub fn with_chain(chain: Vec<Box<dyn ResolveIdentity>>) -> Self {
        Self { chain }
    }

    pub async fn resolve(&self, session: &Session) -> ApiResult<Option<User>> {
        for link in &self.chain {
            if let Resolution::Resolved(user) = link.resolve(session).await? {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| ApiError::Internal(anyhow::anyhow!(message)))?;
        state
            .resolver
            .resolve(&session)
            .await?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated)
    }
}
