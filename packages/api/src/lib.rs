//! # API crate: HTTP surface of the pet family service
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`app`] | [`AppState`] and [`build_router`], the full route table |
//! | [`auth`] | Password hashing, session keys, the identity resolver chain, OAuth providers, auth endpoints |
//! | [`db`] | PostgreSQL pool, migrations and the [`db::PgStorage`] backend |
//! | [`error`] | [`ApiError`], the single error type every handler returns |
//! | [`handlers`] | Family, pet, note, file, vaccination, object and sharing endpoints |
//! | [`membership`] | Family membership rules and the membership guards |
//! | [`models`] | Composite response shapes |

pub mod app;
pub mod auth;
pub mod db;
pub mod error;
pub mod handlers;
pub mod membership;
pub mod models;

pub use app::{build_router, AppState};
pub use error::{ApiError, ApiResult};
