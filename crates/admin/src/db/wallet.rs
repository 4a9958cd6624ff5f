//! Credit balance changes made from the back office.
//!
//! Grants, verification bonuses, commission payouts and refunds all move the
//! balance on `store.profile.credits` and record a `store.wallet_transaction`
//! row on the same connection, so callers wrap them in their transaction.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use solewave_core::credits::{apply_to_balance, dollars_for_credits};
use solewave_core::{TransactionStatus, TransactionType, UserId};

use super::RepositoryError;

/// A completed wallet entry to record.
#[derive(Debug, Clone)]
pub struct WalletEntry<'r> {
    /// Dollar amount involved (commission paid, or credit value).
    pub amount: Decimal,
    /// Signed change to the balance.
    pub credits: i64,
    pub kind: TransactionType,
    pub reference: Option<&'r str>,
}

/// Apply `entry` to the balance and record it. Returns the new balance.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the balance would go negative.
/// Returns `RepositoryError::NotFound` if the user has no profile.
pub async fn apply(
    conn: &mut PgConnection,
    user_id: UserId,
    entry: &WalletEntry<'_>,
) -> Result<i64, RepositoryError> {
    let balance: i64 =
        sqlx::query_scalar("SELECT credits FROM store.profile WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(RepositoryError::NotFound)?;
    let new_balance = apply_to_balance(balance, entry.credits)
        .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

    sqlx::query("UPDATE store.profile SET credits = $2, updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .bind(new_balance)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r"
        INSERT INTO store.wallet_transaction
            (user_id, amount, credits_added, transaction_type, status, reference)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(user_id)
    .bind(entry.amount)
    .bind(entry.credits)
    .bind(entry.kind)
    .bind(TransactionStatus::Completed)
    .bind(entry.reference)
    .execute(&mut *conn)
    .await?;

    Ok(new_balance)
}

/// Grant (or with a negative amount, withdraw) credits in their own transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the balance would go negative.
/// Returns `RepositoryError::NotFound` if the user has no profile.
pub async fn grant(
    pool: &PgPool,
    user_id: UserId,
    credits: i64,
    note: Option<&str>,
) -> Result<i64, RepositoryError> {
    let entry = WalletEntry {
        amount: dollars_for_credits(credits.saturating_abs()),
        credits,
        kind: TransactionType::Grant,
        reference: note,
    };

    let mut tx = pool.begin().await?;
    let balance = apply(&mut tx, user_id, &entry).await?;
    tx.commit().await?;
    Ok(balance)
}
