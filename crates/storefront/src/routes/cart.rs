//! Cart route handlers.
//!
//! The cart lives in the visitor's session, so guests can shop before
//! signing up. Every mutation returns the full cart.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use solewave_core::ProductId;
use solewave_core::cart::{Cart, CartLine};

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Product, session_keys};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session, empty if none.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Types
// =============================================================================

/// Cart response body.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

/// One cart line with its total.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    line: line.clone(),
                    line_total: line.line_total(),
                })
                .collect(),
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
        }
    }
}

/// `POST /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// `PATCH /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct UpdateItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

/// `DELETE /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
}

fn normalize_size(size: Option<String>) -> Option<String> {
    size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Reject a cart that would hold more of `product` than is in stock.
fn ensure_stock(product: &Product, wanted: u32) -> Result<()> {
    let available = u32::try_from(product.stock.max(0)).unwrap_or_default();
    if wanted > available {
        return Err(AppError::Conflict(format!(
            "Only {available} left of {}",
            product.title
        )));
    }
    Ok(())
}

async fn active_product(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/cart`
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /api/cart/items`
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItem>,
) -> Result<Json<CartView>> {
    let product = active_product(&state, body.product_id).await?;
    let mut cart = load_cart(&session).await?;

    ensure_stock(
        &product,
        cart.product_quantity(product.id).saturating_add(body.quantity),
    )?;
    cart.add(CartLine {
        product_id: product.id,
        size: normalize_size(body.size),
        title: product.title.clone(),
        brand: product.brand.clone(),
        image: product.images.first().cloned(),
        unit_price: product.price,
        quantity: body.quantity,
    })?;
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", product.id.to_string())],
    );
    Ok(Json(CartView::from(&cart)))
}

/// `PATCH /api/cart/items`
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpdateItem>,
) -> Result<Json<CartView>> {
    let size = normalize_size(body.size);
    let mut cart = load_cart(&session).await?;

    if body.quantity > 0 {
        let product = active_product(&state, body.product_id).await?;
        let others = cart
            .product_quantity(product.id)
            .saturating_sub(cart.quantity_of(product.id, size.as_deref()));
        ensure_stock(&product, others.saturating_add(body.quantity))?;
    }
    cart.update_quantity(body.product_id, size.as_deref(), body.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// `DELETE /api/cart/items`
pub async fn remove(session: Session, Json(body): Json<RemoveItem>) -> Result<Json<CartView>> {
    let size = normalize_size(body.size);
    let mut cart = load_cart(&session).await?;
    cart.remove(body.product_id, size.as_deref())?;
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `DELETE /api/cart`
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
