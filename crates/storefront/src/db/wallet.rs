//! Credit balance and wallet transaction log.
//!
//! The balance lives on `store.profile.credits`; every change is mirrored by a
//! row in `store.wallet_transaction` written in the same transaction.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use solewave_core::credits::apply_to_balance;
use solewave_core::{TransactionStatus, TransactionType, UserId};

use super::RepositoryError;
use crate::models::wallet::WalletTransaction;

/// How many transactions the wallet view returns.
pub const HISTORY_LIMIT: i64 = 50;

/// A wallet entry to record.
#[derive(Debug, Clone)]
pub struct NewTransaction<'r> {
    pub amount: Decimal,
    pub credits: i64,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub reference: Option<&'r str>,
}

/// Lock the profile row and read the balance.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user has no profile.
pub async fn lock_balance(conn: &mut PgConnection, user_id: UserId) -> Result<i64, RepositoryError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT credits FROM store.profile WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Apply `tx.credits` to the balance and record the transaction.
///
/// Failed transactions are recorded without touching the balance.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the balance would go negative.
/// Returns `RepositoryError::NotFound` if the user has no profile.
pub async fn apply(
    conn: &mut PgConnection,
    user_id: UserId,
    tx: &NewTransaction<'_>,
) -> Result<WalletTransaction, RepositoryError> {
    if tx.status == TransactionStatus::Completed && tx.credits != 0 {
        let balance = lock_balance(&mut *conn, user_id).await?;
        let new_balance = apply_to_balance(balance, tx.credits)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        sqlx::query("UPDATE store.profile SET credits = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(new_balance)
            .execute(&mut *conn)
            .await?;
    }

    let row = sqlx::query_as::<_, WalletTransaction>(
        r"
        INSERT INTO store.wallet_transaction
            (user_id, amount, credits_added, transaction_type, status, reference)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, amount, credits_added, transaction_type, status, reference, created_at
        ",
    )
    .bind(user_id)
    .bind(tx.amount)
    .bind(tx.credits)
    .bind(tx.kind)
    .bind(tx.status)
    .bind(tx.reference)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

/// Repository for wallet reads and standalone wallet writes.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no profile.
    pub async fn balance(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        sqlx::query_scalar::<_, i64>("SELECT credits FROM store.profile WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Most recent transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<WalletTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, WalletTransaction>(
            r"
            SELECT id, user_id, amount, credits_added, transaction_type, status, reference, created_at
            FROM store.wallet_transaction
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Record a single wallet entry in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the balance would go negative.
    pub async fn record(
        &self,
        user_id: UserId,
        tx: &NewTransaction<'_>,
    ) -> Result<WalletTransaction, RepositoryError> {
        let mut db_tx = self.pool.begin().await?;
        let row = apply(&mut db_tx, user_id, tx).await?;
        db_tx.commit().await?;
        Ok(row)
    }
}
