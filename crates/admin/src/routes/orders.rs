//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use solewave_core::{OrderId, OrderStatus};

use super::audit;
use crate::db::OrderRepository;
use crate::db::orders::StatusChange;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{OrderDetail, OrderQuery, OrderSummary, Page};
use crate::state::AppState;

/// `PATCH /api/orders/{id}/status` body.
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// `GET /api/orders?status&page&per_page`
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<OrderSummary>>> {
    let page = OrderRepository::new(state.pool()).list(query).await?;
    Ok(Json(page))
}

/// `GET /api/orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// `PATCH /api/orders/{id}/status`
///
/// Cancelling or refunding an order that never shipped puts its items back in
/// stock and returns any redeemed credits.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<StatusChange>> {
    let change = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;

    info!(
        order_id = %id,
        from = %change.from,
        to = %change.to,
        restocked = change.restocked,
        "Order status changed"
    );
    audit(
        &state,
        &admin,
        "order.status",
        &format!("order:{id}"),
        json!({ "from": change.from, "to": change.to, "credits_refunded": change.credits_refunded }),
    )
    .await;

    Ok(Json(change))
}
