//! HTTP application wiring: shared state and the route table.
//!
//! The session layer is not added here. The binary wraps the router with a
//! `SessionManagerLayer` over whichever session store it configured, and tests do
//! the same with `tower_sessions::MemoryStore`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use store::{ObjectStorage, Storage};
use tower_http::trace::TraceLayer;

use crate::auth::{self, IdentityResolver, OAuthProviders};
use crate::handlers::{families, files, health, notes, objects, pets, sharing, vaccinations};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub objects: Arc<dyn ObjectStorage>,
    pub resolver: Arc<IdentityResolver>,
    pub oauth: OAuthProviders,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, objects: Arc<dyn ObjectStorage>, oauth: OAuthProviders) -> Self {
        let resolver = Arc::new(IdentityResolver::new(store.clone()));
        Self {
            store,
            objects,
            resolver,
            oauth,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    Router::new()
        .route("/api/health", get(health::health))
        // Auth
        .route("/api/auth/register", post(auth::routes::register))
        .route("/api/auth/login", post(auth::routes::login))
        .route("/api/auth/logout", post(auth::routes::logout))
        .route("/api/logout", get(auth::routes::logout_redirect))
        .route("/api/auth/user", get(auth::routes::current_user))
        .route("/api/auth/login/{provider}", get(auth::routes::oauth_login))
        .route("/auth/{provider}/callback", get(auth::routes::oauth_callback))
        // Families
        .route(
            "/api/families",
            get(families::list_families).post(families::create_family),
        )
        .route(
            "/api/families/{id}",
            get(families::get_family).delete(families::delete_family),
        )
        .route("/api/families/{id}/members", post(families::add_member))
        .route("/api/families/{id}/members/me", delete(families::leave_family))
        .route(
            "/api/families/{id}/members/{user_id}",
            put(families::update_member).delete(families::remove_member),
        )
        .route("/api/families/{id}/qr", get(sharing::family_qr))
        .route("/api/families/{id}/pets", get(pets::list_family_pets))
        .route("/api/families/{id}/notes", get(notes::list_family_notes))
        .route("/api/families/{id}/notes/recent", get(notes::recent_family_notes))
        .route(
            "/api/families/{id}/vaccinations/upcoming",
            get(vaccinations::upcoming),
        )
        // Pets
        .route("/api/pets", post(pets::create_pet))
        .route(
            "/api/pets/{id}",
            get(pets::get_pet).put(pets::update_pet).delete(pets::delete_pet),
        )
        .route("/api/pets/{id}/image", put(pets::set_pet_image))
        .route("/api/pets/{id}/notes", get(notes::list_pet_notes))
        .route("/api/pets/{id}/files", get(files::list_pet_files))
        .route("/api/pets/{id}/vaccinations", get(vaccinations::list_pet_vaccinations))
        // Notes
        .route("/api/notes", post(notes::create_note))
        .route(
            "/api/notes/{id}",
            get(notes::get_note).put(notes::update_note).delete(notes::delete_note),
        )
        // Files
        .route("/api/pet-files", post(files::create_pet_file))
        .route(
            "/api/pet-files/{id}",
            get(files::get_pet_file).delete(files::delete_pet_file),
        )
        // Vaccinations
        .route("/api/vaccinations", post(vaccinations::create_vaccination))
        .route(
            "/api/vaccinations/{id}",
            put(vaccinations::update_vaccination).delete(vaccinations::delete_vaccination),
        )
        // Objects
        .route("/api/objects/upload", post(objects::request_upload))
        .route(
            "/api/objects/uploads/{id}",
            put(objects::put_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/objects/{*path}", get(objects::serve_object))
        // Sharing
        .route("/public/pet/{id}", get(sharing::public_pet))
        .layer(trace_layer)
        .with_state(state)
}
