//! Wallet transaction model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use solewave_core::{TransactionStatus, TransactionType, UserId, WalletTransactionId};

/// One entry of a user's credit history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WalletTransaction {
    pub id: WalletTransactionId,
    pub user_id: UserId,
    /// Dollar amount involved (card charge, commission, or credit value).
    pub amount: Decimal,
    /// Signed change to the balance.
    pub credits_added: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}
