//! Credits wallet route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use solewave_core::credits::{credits_for_purchase, dollars_for_credits};

use crate::db::WalletRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::WalletTransaction;
use crate::services::wallet::{top_up as purchase_credits, validate_top_up};
use crate::state::AppState;

/// `GET /api/wallet` response.
#[derive(Debug, Serialize)]
pub struct WalletView {
    pub credits: i64,
    /// Dollar value of the balance at the base rate.
    pub value: Decimal,
    pub transactions: Vec<WalletTransaction>,
}

/// `POST /api/wallet/top-up` body.
#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: Decimal,
    pub payment_nonce: String,
}

/// `POST /api/wallet/top-up` response.
#[derive(Debug, Serialize)]
pub struct TopUpResponse {
    pub credits_added: i64,
    pub balance: i64,
    pub transaction: WalletTransaction,
}

/// `GET /api/wallet`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WalletView>> {
    let wallet = WalletRepository::new(state.pool());
    let credits = wallet.balance(user.id).await?;
    let transactions = wallet.history(user.id).await?;

    Ok(Json(WalletView {
        credits,
        value: dollars_for_credits(credits),
        transactions,
    }))
}

/// `GET /api/wallet/preview?amount=` response.
#[derive(Debug, Serialize)]
pub struct TopUpPreview {
    pub amount: Decimal,
    pub credits: i64,
}

/// `POST /api/wallet/top-up`
///
/// A failed charge answers 402; the failed attempt stays in the history.
#[instrument(skip(state, body), fields(user_id = %user.id, amount = %body.amount))]
pub async fn top_up(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<TopUpRequest>,
) -> Result<(StatusCode, Json<TopUpResponse>)> {
    let transaction = purchase_credits(
        state.pool(),
        state.payments(),
        user.id,
        body.amount,
        &body.payment_nonce,
    )
    .await?;
    let balance = WalletRepository::new(state.pool()).balance(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(TopUpResponse {
            credits_added: transaction.credits_added,
            balance,
            transaction,
        }),
    ))
}

/// `GET /api/wallet/preview` query.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub amount: Decimal,
}

/// `GET /api/wallet/preview?amount=`
///
/// Credits a top-up of `amount` would add, bonus included.
pub async fn preview(Query(query): Query<PreviewQuery>) -> Result<Json<TopUpPreview>> {
    validate_top_up(query.amount)?;
    Ok(Json(TopUpPreview {
        amount: query.amount,
        credits: credits_for_purchase(query.amount),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_includes_bonus() {
        let amount = Decimal::from(50);
        let Json(preview) = preview(Query(PreviewQuery { amount })).await.unwrap();
        assert_eq!(preview.credits, 5_500);
    }

    #[tokio::test]
    async fn test_preview_rejects_out_of_range() {
        let result = preview(Query(PreviewQuery {
            amount: Decimal::from(1_000),
        }))
        .await;
        assert!(result.is_err());
    }
}
