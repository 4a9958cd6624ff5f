//! Cached catalog reads.
//!
//! Listing pages, product pages and the brand list are cached in `moka` for
//! five minutes. Stock shown from the cache can be stale; checkout re-reads
//! stock under a row lock.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::product::{Product, ProductFilter, ProductPage};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Page(ProductFilter),
    Product(String),
    Brands,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Page(Arc<ProductPage>),
    Product(Arc<Product>),
    Brands(Arc<Vec<String>>),
}

/// Catalog reads with a short-lived cache in front of `PostgreSQL`.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    /// Create a catalog service over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300))
            .build();

        Self {
            inner: Arc::new(CatalogInner { pool, cache }),
        }
    }

    fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.pool)
    }

    /// One page of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(&self, filter: ProductFilter) -> Result<Arc<ProductPage>, RepositoryError> {
        let key = CacheKey::Page(filter.clone());
        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let page = Arc::new(self.products().list(&filter).await?);
        self.inner
            .cache
            .insert(key, CacheValue::Page(Arc::clone(&page)))
            .await;
        Ok(page)
    }

    /// A product by slug, `None` if missing or inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn product(&self, slug: &str) -> Result<Option<Arc<Product>>, RepositoryError> {
        let key = CacheKey::Product(slug.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!(slug, "Cache hit for product");
            return Ok(Some(product));
        }

        let Some(product) = self.products().get_by_slug(slug).await? else {
            return Ok(None);
        };
        let product = Arc::new(product);
        self.inner
            .cache
            .insert(key, CacheValue::Product(Arc::clone(&product)))
            .await;
        Ok(Some(product))
    }

    /// Distinct brands of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn brands(&self) -> Result<Arc<Vec<String>>, RepositoryError> {
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&CacheKey::Brands).await {
            return Ok(brands);
        }

        let brands = Arc::new(self.products().brands().await?);
        self.inner
            .cache
            .insert(CacheKey::Brands, CacheValue::Brands(Arc::clone(&brands)))
            .await;
        Ok(brands)
    }
}
