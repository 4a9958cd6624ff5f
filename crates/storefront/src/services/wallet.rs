//! Buying credits with a card.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use solewave_core::credits::credits_for_purchase;
use solewave_core::{TransactionStatus, TransactionType, UserId};

use super::payment::{PaymentError, PaymentGateway};
use crate::db::wallet::NewTransaction;
use crate::db::{RepositoryError, WalletRepository};
use crate::models::wallet::WalletTransaction;

/// Smallest top-up in dollars.
pub const MIN_TOP_UP: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Largest top-up in dollars.
pub const MAX_TOP_UP: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Errors from a credit purchase.
#[derive(Debug, Error)]
pub enum TopUpError {
    /// Amount outside `MIN_TOP_UP..=MAX_TOP_UP` or with fractional cents.
    #[error("top-up amount must be between ${MIN_TOP_UP} and ${MAX_TOP_UP}")]
    InvalidAmount,

    /// The charge failed; a `failed` transaction was recorded.
    #[error("payment failed: {0}")]
    Payment(#[source] PaymentError),

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Validate a top-up amount.
///
/// # Errors
///
/// Returns `TopUpError::InvalidAmount` outside the allowed range or when the
/// amount has more than two decimal places.
pub fn validate_top_up(amount: Decimal) -> Result<(), TopUpError> {
    if amount < MIN_TOP_UP || amount > MAX_TOP_UP || amount.normalize().scale() > 2 {
        return Err(TopUpError::InvalidAmount);
    }
    Ok(())
}

/// Charge `amount` and credit the wallet with the purchase bonus.
///
/// # Errors
///
/// Returns `TopUpError::Payment` if the gateway rejects the charge.
pub async fn top_up(
    pool: &PgPool,
    gateway: &PaymentGateway,
    user_id: UserId,
    amount: Decimal,
    nonce: &str,
) -> Result<WalletTransaction, TopUpError> {
    validate_top_up(amount)?;
    let wallet = WalletRepository::new(pool);
    let credits = credits_for_purchase(amount);
    let reference = format!("top-up:{user_id}");

    match gateway.charge(amount, nonce, &reference).await {
        Ok(charge) => {
            let reference = format!("top-up:{}", charge.id);
            let txn = wallet
                .record(
                    user_id,
                    &NewTransaction {
                        amount,
                        credits,
                        kind: TransactionType::TopUp,
                        status: TransactionStatus::Completed,
                        reference: Some(&reference),
                    },
                )
                .await?;
            info!(%user_id, credits, "Credits purchased");
            Ok(txn)
        }
        Err(e) => {
            warn!(%user_id, error = %e, "Credit purchase failed");
            wallet
                .record(
                    user_id,
                    &NewTransaction {
                        amount,
                        credits,
                        kind: TransactionType::TopUp,
                        status: TransactionStatus::Failed,
                        reference: None,
                    },
                )
                .await?;
            Err(TopUpError::Payment(e))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_top_up_bounds() {
        let d = |s: &str| s.parse::<Decimal>().unwrap();
        assert!(validate_top_up(d("4.99")).is_err());
        assert!(validate_top_up(d("5")).is_ok());
        assert!(validate_top_up(d("25.50")).is_ok());
        assert!(validate_top_up(d("500.00")).is_ok());
        assert!(validate_top_up(d("500.01")).is_err());
        assert!(validate_top_up(d("10.005")).is_err());
    }
}
