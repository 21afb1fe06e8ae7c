//! # Database module: PostgreSQL
//!
//! - [`connect`] opens a `PgPool` for a connection URL and runs the embedded
//!   migrations from `packages/api/migrations`.
//! - [`PgStorage`] implements [`store::Storage`] on that pool. Cascades and the
//!   unique `(family_id, user_id)` and `(provider, provider_subject)` constraints
//!   live in the schema; family creation runs in one transaction.

mod pool;
mod postgres;

pub use pool::{connect, migrate};
pub use postgres::PgStorage;
