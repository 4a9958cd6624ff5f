//! Database operations for the back office.
//!
//! # Schema: `store`
//!
//! Shared with the storefront. The admin reads everything and writes order
//! status, the catalog, roles, creator terms, invites, verification reviews,
//! wallet grants and payouts, and the audit log.
//!
//! ## Tables
//!
//! - `user` / `profile` - Accounts, roles, creator program state, credit balance
//! - `product` - Catalog
//! - `order` / `order_item` - Orders with pricing and commission snapshots
//! - `creator_invite` - Creator program invitations
//! - `social_verification_request` - Follower count verification
//! - `wallet_transaction` - Credit history
//! - `audit_log` - Admin mutations
//! - `tower_sessions.admin_session` - Admin sessions
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p solewave-cli -- migrate
//! ```

pub mod analytics;
pub mod audit;
pub mod creators;
pub mod invites;
pub mod orders;
pub mod products;
pub mod social;
pub mod users;
pub mod wallet;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use solewave_core::OrderStatus;

pub use analytics::AnalyticsRepository;
pub use audit::AuditRepository;
pub use creators::CreatorRepository;
pub use invites::InviteRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use social::SocialRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or a write that does not fit the current state.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Order statuses that count as sales, as bind values for `status::TEXT = ANY($n)`.
pub(crate) fn sale_statuses() -> Vec<&'static str> {
    OrderStatus::SALES.iter().map(|s| s.as_str()).collect()
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_statuses() {
        assert_eq!(sale_statuses(), vec!["paid", "shipped", "delivered"]);
    }
}
