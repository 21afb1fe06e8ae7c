//! PetFamily HTTP server.

mod settings;

use std::sync::Arc;

use anyhow::Context;
use api::auth::{OAuthCredentials, OAuthProviders};
use api::db::PgStorage;
use api::{build_router, AppState};
use store::{FileStore, MemoryStore, ObjectStorage};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::EnvFilter;

use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::new().context("failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let objects: Arc<dyn ObjectStorage> = Arc::new(FileStore::new(&settings.storage.upload_dir));
    let github = settings.oauth.github.as_ref().map(OAuthCredentials::from);
    let google = settings.oauth.google.as_ref().map(OAuthCredentials::from);
    let oauth = OAuthProviders::from_credentials(
        &settings.oauth.redirect_base,
        github.as_ref(),
        google.as_ref(),
    )
    .context("invalid OAuth configuration")?;
    let providers: Vec<_> = oauth.names().collect();
    tracing::info!(?providers, "OAuth providers configured");

    match settings.database.url.as_deref() {
        Some(url) => {
            let pool = api::db::connect(url, settings.database.max_connections)
                .await
                .context("failed to connect to database")?;
            let session_store = PostgresStore::new(pool.clone());
            session_store
                .migrate()
                .await
                .context("failed to migrate session store")?;
            let state = AppState::new(Arc::new(PgStorage::new(pool)), objects, oauth);
            serve(&settings, state, session_store).await
        }
        None => {
            tracing::warn!("no database configured, data is kept in memory only");
            let state = AppState::new(Arc::new(MemoryStore::new()), objects, oauth);
            serve(&settings, state, tower_sessions::MemoryStore::default()).await
        }
    }
}

async fn serve<S>(settings: &Settings, state: AppState, session_store: S) -> anyhow::Result<()>
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(settings.session.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(settings.session.ttl_days)))
        .with_signed(session_key(settings.session.secret.as_deref()));

    let backend = state.store.backend_name();
    let router = build_router(state).layer(session_layer);

    let addr = settings.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, backend, "server listening");

    axum::serve(listener, router).await?;
    Ok(())
}

/// Cookie signing key from the configured secret. Without a usable secret a
/// random key is used and sessions do not survive a restart.
fn session_key(secret: Option<&str>) -> Key {
    match secret.map(|s| Key::try_from(s.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(err)) => {
            tracing::warn!(error = %err, "session secret must be at least 64 bytes, using a random key");
            Key::generate()
        }
        None => {
            tracing::warn!("no session secret configured, using a random key");
            Key::generate()
        }
    }
}
