//! Catalog route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::product::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::models::{Product, ProductFilter, ProductPage, ProductSort};
use crate::state::AppState;

/// Raw catalog query string.
///
/// `brand` may repeat and each value may hold a comma-separated list, so
/// `?brand=nike&brand=adidas` and `?brand=nike,adidas` are the same filter.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub brand: Vec<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl CatalogQuery {
    /// Normalize into a filter, which doubles as the cache key.
    ///
    /// Blank strings are dropped, brands are trimmed, deduplicated and
    /// sorted, paging is clamped.
    #[must_use]
    pub fn into_filter(self) -> ProductFilter {
        let non_blank = |s: Option<String>| {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        let mut brands: Vec<String> = self
            .brand
            .iter()
            .flat_map(|b| b.split(','))
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_lowercase)
            .collect();
        brands.sort();
        brands.dedup();

        ProductFilter {
            query: non_blank(self.q),
            brands,
            category: non_blank(self.category).map(|c| c.to_lowercase()),
            min_price: self.min_price.filter(|p| *p >= Decimal::ZERO),
            max_price: self.max_price.filter(|p| *p >= Decimal::ZERO),
            in_stock_only: self.in_stock,
            sort: self.sort,
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }
}

/// Product as returned to shoppers, with its derived availability.
#[derive(Debug, Serialize)]
pub struct ProductView<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub availability_label: &'a str,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            product,
            availability_label: product.availability_label(),
        }
    }
}

/// Catalog page response.
#[derive(Debug, Serialize)]
pub struct ProductPageView<'a> {
    pub items: Vec<ProductView<'a>>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<'a> From<&'a ProductPage> for ProductPageView<'a> {
    fn from(page: &'a ProductPage) -> Self {
        Self {
            items: page.items.iter().map(ProductView::from).collect(),
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response> {
    let page: Arc<ProductPage> = state.catalog().list(query.into_filter()).await?;
    Ok(Json(ProductPageView::from(page.as_ref())).into_response())
}

/// `GET /api/products/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let product = state
        .catalog()
        .product(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {slug} not found")))?;
    Ok(Json(ProductView::from(product.as_ref())).into_response())
}

/// `GET /api/brands`
pub async fn brands(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let brands = state.catalog().brands().await?;
    Ok(Json(brands.as_ref().clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    async fn brands_for(uri: &str) -> (StatusCode, Vec<String>) {
        let app = Router::new().route(
            "/api/products",
            get(|Query(query): Query<CatalogQuery>| async move {
                Json(query.into_filter().brands)
            }),
        );
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_repeated_brand_parameter() {
        let (status, brands) = brands_for("/api/products?brand=nike&brand=adidas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(brands, vec!["adidas", "nike"]);
    }

    #[tokio::test]
    async fn test_comma_separated_brand_parameter() {
        let (status, brands) = brands_for("/api/products?brand=nike,adidas&sort=price_asc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(brands, vec!["adidas", "nike"]);

        let (_, mixed) = brands_for("/api/products?brand=Nike,puma&brand=adidas").await;
        assert_eq!(mixed, vec!["adidas", "nike", "puma"]);
    }

    #[test]
    fn test_query_normalization() {
        let filter = CatalogQuery {
            q: Some("  ".to_string()),
            brand: vec!["Nike, adidas,,nike ".to_string()],
            category: Some("Sneakers".to_string()),
            page: Some(0),
            per_page: Some(500),
            ..CatalogQuery::default()
        }
        .into_filter();

        assert_eq!(filter.query, None);
        assert_eq!(filter.brands, vec!["adidas", "nike"]);
        assert_eq!(filter.category.as_deref(), Some("sneakers"));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_equivalent_queries_share_a_cache_key() {
        let a = CatalogQuery {
            brand: vec!["nike,adidas".to_string()],
            ..CatalogQuery::default()
        }
        .into_filter();
        let b = CatalogQuery {
            brand: vec!["Adidas ".to_string(), " Nike".to_string()],
            page: Some(1),
            per_page: Some(DEFAULT_PER_PAGE),
            ..CatalogQuery::default()
        }
        .into_filter();
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_prices_ignored() {
        let filter = CatalogQuery {
            min_price: Some(Decimal::NEGATIVE_ONE),
            max_price: Some(Decimal::ONE_HUNDRED),
            ..CatalogQuery::default()
        }
        .into_filter();
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.max_price, Some(Decimal::ONE_HUNDRED));
    }
}
