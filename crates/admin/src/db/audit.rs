//! Audit log of admin mutations.

use serde_json::Value;
use sqlx::PgPool;

use solewave_core::UserId;

use super::RepositoryError;

/// Repository for `store.audit_log`.
pub struct AuditRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(
        &self,
        actor: UserId,
        action: &str,
        target: &str,
        details: &Value,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO store.audit_log (actor_id, action, target, details) VALUES ($1, $2, $3, $4)",
        )
        .bind(actor)
        .bind(action)
        .bind(target)
        .bind(details)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
