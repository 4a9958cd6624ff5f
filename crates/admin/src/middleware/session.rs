//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings (SameSite=Strict, 24hr expiry) in their own
//! table so admin and storefront sessions never mix.

use sqlx::PgPool;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "sw_admin_session";

/// Session table in the `tower_sessions` schema, created by `sw-cli migrate`.
pub const SESSION_TABLE: &str = "admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Session store backed by the admin session table.
///
/// # Panics
///
/// Panics if the table name is invalid (never happens with the hardcoded
/// [`SESSION_TABLE`]).
#[must_use]
pub fn session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
        .with_table_name(SESSION_TABLE)
        .expect("valid table name")
}

/// Create the session layer with `PostgreSQL` store and a signed cookie.
///
/// # Panics
///
/// See [`session_store`].
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    SessionManagerLayer::new(session_store(pool))
        .with_signed(config.cookie_key())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        // SameSite=Strict for admin (stricter than storefront's Lax)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
