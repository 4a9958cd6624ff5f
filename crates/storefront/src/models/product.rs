//! Catalog types: products, filters and paging.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solewave_core::ProductId;
use solewave_core::stock::stock_label;

/// Default page size for catalog listings.
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 48;

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub images: Vec<String>,
    pub availability: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Availability label shown to shoppers.
    ///
    /// An explicit label set by staff wins; otherwise it is derived from stock.
    #[must_use]
    pub fn availability_label(&self) -> &str {
        if let Some(label) = self.availability.as_deref().filter(|s| !s.is_empty()) {
            return label;
        }
        stock_label(self.stock)
    }

    /// Whether at least one unit can be bought.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
}

impl ProductSort {
    /// SQL `ORDER BY` clause for this sort. Ties break on id for stable paging.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id DESC",
            Self::Title => "title ASC, id ASC",
        }
    }
}

/// Normalized catalog filter. Also the cache key for catalog pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProductFilter {
    /// Case-insensitive search over title, brand and description.
    pub query: Option<String>,
    /// Brands to include (exact, case-insensitive). Empty means all.
    pub brands: Vec<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
    pub sort: ProductSort,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl ProductFilter {
    /// Rows to skip for the current page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl ProductPage {
    /// Assemble a page, computing `total_pages` from `total`.
    #[must_use]
    pub fn new(items: Vec<Product>, page: u32, per_page: u32, total: i64) -> Self {
        let per = i64::from(per_page.max(1));
        Self {
            items,
            page,
            per_page,
            total,
            total_pages: (total + per - 1) / per,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32, availability: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            slug: "air-runner".to_string(),
            title: "Air Runner".to_string(),
            brand: "Solewave".to_string(),
            category: "sneakers".to_string(),
            description: String::new(),
            price: Decimal::new(12_000, 2),
            stock,
            images: vec![],
            availability: availability.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_availability_label() {
        assert_eq!(product(0, None).availability_label(), "sold_out");
        assert_eq!(product(5, None).availability_label(), "low_stock");
        assert_eq!(product(6, None).availability_label(), "in_stock");
        assert_eq!(
            product(0, Some("pre_order")).availability_label(),
            "pre_order"
        );
        assert_eq!(product(3, Some("")).availability_label(), "low_stock");
    }

    #[test]
    fn test_page_math() {
        assert_eq!(ProductPage::new(vec![], 1, 24, 0).total_pages, 0);
        assert_eq!(ProductPage::new(vec![], 1, 24, 24).total_pages, 1);
        assert_eq!(ProductPage::new(vec![], 1, 24, 25).total_pages, 2);

        let filter = ProductFilter {
            page: 3,
            per_page: 24,
            ..ProductFilter::default()
        };
        assert_eq!(filter.offset(), 48);
    }
}
