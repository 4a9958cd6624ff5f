//! Catalog queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use solewave_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductFilter, ProductPage};

const PRODUCT_COLUMNS: &str = "id, slug, title, brand, category, description, price, stock, \
     images, availability, is_active, created_at, updated_at";

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of active products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM store.product");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product"
        ));
        push_filter(&mut select, filter);
        select.push(" ORDER BY ");
        select.push(filter.sort.order_by());
        select.push(" LIMIT ");
        select.push_bind(i64::from(filter.per_page));
        select.push(" OFFSET ");
        select.push_bind(filter.offset());

        let items = select
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(ProductPage::new(items, filter.page, filter.per_page, total))
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Get an active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Distinct brands of active products, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<String>, RepositoryError> {
        let brands = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT brand FROM store.product WHERE is_active ORDER BY brand",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(brands)
    }
}

/// Append the `WHERE` clause for `filter`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE is_active");

    if let Some(q) = &filter.query {
        let pattern = format!("%{}%", escape_like(q));
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR brand ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if !filter.brands.is_empty() {
        let brands: Vec<String> = filter.brands.iter().map(|b| b.to_lowercase()).collect();
        qb.push(" AND LOWER(brand) = ANY(");
        qb.push_bind(brands);
        qb.push(")");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND LOWER(category) = ");
        qb.push_bind(category.to_lowercase());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ");
        qb.push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ");
        qb.push_bind(max);
    }
    if filter.in_stock_only {
        qb.push(" AND stock > 0");
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::product::ProductSort;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("air max"), "air max");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_filter_sql() {
        let filter = ProductFilter {
            query: Some("dunk".to_string()),
            brands: vec!["Nike".to_string()],
            category: None,
            min_price: Some(Decimal::new(50, 0)),
            max_price: None,
            in_stock_only: true,
            sort: ProductSort::PriceAsc,
            page: 1,
            per_page: 24,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM store.product");
        push_filter(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("WHERE is_active"));
        assert!(sql.contains("title ILIKE $1"));
        assert!(sql.contains("LOWER(brand) = ANY($4)"));
        assert!(sql.contains("price >= $5"));
        assert!(sql.contains("stock > 0"));
        assert!(!sql.contains("category"));
    }
}
