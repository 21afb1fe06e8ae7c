//! Session keys and typed accessors.
//!
//! | Key | Value | Written by |
//! |-----|-------|------------|
//! | [`SESSION_USER_ID_KEY`] | local user id | register, password login |
//! | [`FEDERATED_CLAIMS_KEY`] | [`FederatedProfile`] | OAuth callback |
//! | [`PENDING_OAUTH_KEY`] | [`PendingOAuth`] | OAuth login redirect |

use serde::{Deserialize, Serialize};
use store::models::FederatedProfile;
use tower_sessions::Session;
use uuid::Uuid;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const FEDERATED_CLAIMS_KEY: &str = "federated_claims";
pub const PENDING_OAUTH_KEY: &str = "pending_oauth";

/// CSRF state and PKCE verifier for an OAuth login in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOAuth {
    pub provider: String,
    pub state: String,
    pub verifier: String,
}

pub async fn local_user_id(session: &Session) -> Result<Option<Uuid>, tower_sessions::session::Error> {
    session.get(SESSION_USER_ID_KEY).await
}

/// Start a fresh local session. The id is cycled to prevent fixation.
pub async fn sign_in_local(session: &Session, user_id: Uuid) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.remove_value(FEDERATED_CLAIMS_KEY).await?;
    session.insert(SESSION_USER_ID_KEY, user_id).await
}

pub async fn federated_claims(
    session: &Session,
) -> Result<Option<FederatedProfile>, tower_sessions::session::Error> {
    session.get(FEDERATED_CLAIMS_KEY).await
}

pub async fn sign_in_federated(
    session: &Session,
    profile: &FederatedProfile,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.remove_value(SESSION_USER_ID_KEY).await?;
    session.insert(FEDERATED_CLAIMS_KEY, profile).await
}
