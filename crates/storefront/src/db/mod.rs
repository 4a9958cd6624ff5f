//! Database operations for the storefront.
//!
//! # Schema: `store`
//!
//! Shared with the admin binary. The storefront reads the catalog and writes
//! users, profiles, orders, wallet transactions and social verification
//! requests.
//!
//! ## Tables
//!
//! - `user` / `profile` - Accounts, roles, creator program state, credit balance
//! - `product` - Catalog
//! - `order` / `order_item` - Orders with pricing and commission snapshots
//! - `creator_invite` - Creator program invitations
//! - `social_verification_request` - Follower count verification
//! - `wallet_transaction` - Credit history
//! - `tower_sessions.session` - Visitor sessions
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p solewave-cli -- migrate
//! ```

pub mod creators;
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

pub use creators::CreatorRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use social::SocialRepository;
pub use users::UserRepository;
pub use wallet::WalletRepository;

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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Whether retrying the operation could succeed.
    ///
    /// Pool timeouts and dropped connections are transient; query and
    /// constraint errors are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed)
        )
    }
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

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(RepositoryError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!RepositoryError::Database(sqlx::Error::RowNotFound).is_transient());
        assert!(!RepositoryError::NotFound.is_transient());
        assert!(!RepositoryError::Conflict("email".to_string()).is_transient());
    }
}
