//! Catalog management route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use solewave_core::ProductId;

use super::audit;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Page, PageQuery, Product, ProductInput, SyncReport};
use crate::state::AppState;

/// Most products accepted by one sync call.
pub const MAX_SYNC_PRODUCTS: usize = 1_000;

/// `POST /api/products/{id}/stock` body.
#[derive(Deserialize)]
pub struct StockRequest {
    pub delta: i32,
}

/// `POST /api/products/{id}/stock` response.
#[derive(Serialize)]
pub struct StockResponse {
    pub id: ProductId,
    pub stock: i32,
}

/// `POST /api/products/sync` body.
#[derive(Deserialize)]
pub struct SyncRequest {
    pub products: Vec<ProductInput>,
}

fn validate(input: &ProductInput) -> Result<()> {
    input.validate().map_err(AppError::BadRequest)
}

/// `GET /api/products?page&per_page`
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Product>>> {
    let page = ProductRepository::new(state.pool())
        .list(query.into())
        .await?;
    Ok(Json(page))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    validate(&input)?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;

    info!(product_id = %product.id, slug = %product.slug, "Product created");
    audit(
        &state,
        &admin,
        "product.create",
        &format!("product:{}", product.id),
        json!({ "slug": product.slug }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    validate(&input)?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;

    audit(
        &state,
        &admin,
        "product.update",
        &format!("product:{id}"),
        json!({ "slug": product.slug, "price": product.price, "stock": product.stock }),
    )
    .await;

    Ok(Json(product))
}

/// `DELETE /api/products/{id}`: soft delete.
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).deactivate(id).await?;

    info!(product_id = %id, "Product deactivated");
    audit(
        &state,
        &admin,
        "product.deactivate",
        &format!("product:{id}"),
        json!({}),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/products/{id}/stock`
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<StockRequest>,
) -> Result<Json<StockResponse>> {
    if body.delta == 0 {
        return Err(AppError::BadRequest("delta must not be zero".to_string()));
    }
    let stock = ProductRepository::new(state.pool())
        .adjust_stock(id, body.delta)
        .await?;

    audit(
        &state,
        &admin,
        "product.stock",
        &format!("product:{id}"),
        json!({ "delta": body.delta, "stock": stock }),
    )
    .await;

    Ok(Json(StockResponse { id, stock }))
}

/// `POST /api/products/sync`: upsert by slug.
pub async fn sync(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<SyncRequest>,
) -> Result<Json<SyncReport>> {
    if body.products.is_empty() {
        return Err(AppError::BadRequest("no products to sync".to_string()));
    }
    if body.products.len() > MAX_SYNC_PRODUCTS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_SYNC_PRODUCTS} products per sync"
        )));
    }
    for (index, product) in body.products.iter().enumerate() {
        product
            .validate()
            .map_err(|msg| AppError::BadRequest(format!("product {index}: {msg}")))?;
    }

    let report = ProductRepository::new(state.pool())
        .sync(&body.products)
        .await?;

    info!(
        inserted = report.inserted,
        updated = report.updated,
        "Product sync complete"
    );
    audit(
        &state,
        &admin,
        "product.sync",
        "catalog",
        json!({ "inserted": report.inserted, "updated": report.updated }),
    )
    .await;

    Ok(Json(report))
}
