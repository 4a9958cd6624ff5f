//! Catalog management: CRUD, stock adjustments and bulk sync by slug.

use sqlx::{PgConnection, PgPool};

use solewave_core::ProductId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::product::{Product, ProductInput, SyncReport};
use crate::models::{Page, Paging};

const PRODUCT_COLUMNS: &str = "id, slug, title, brand, category, description, price, stock, \
     images, availability, is_active, created_at, updated_at";

/// Insert or update one product by slug. Returns true if it was inserted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn upsert(conn: &mut PgConnection, input: &ProductInput) -> Result<bool, RepositoryError> {
    // xmax is zero only for a freshly inserted row version
    let inserted: bool = sqlx::query_scalar(
        r"
        INSERT INTO store.product
            (slug, title, brand, category, description, price, stock, images, availability, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (slug) DO UPDATE SET
            title = EXCLUDED.title,
            brand = EXCLUDED.brand,
            category = EXCLUDED.category,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            stock = EXCLUDED.stock,
            images = EXCLUDED.images,
            availability = EXCLUDED.availability,
            is_active = EXCLUDED.is_active,
            updated_at = NOW()
        RETURNING (xmax = 0) AS inserted
        ",
    )
    .bind(&input.slug)
    .bind(input.title.trim())
    .bind(input.brand.trim())
    .bind(&input.category)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.stock)
    .bind(&input.images)
    .bind(input.availability.as_deref())
    .bind(input.is_active)
    .fetch_one(conn)
    .await?;
    Ok(inserted)
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products, including inactive ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, paging: Paging) -> Result<Page<Product>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store.product")
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, paging, total))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO store.product
                (slug, title, brand, category, description, price, stock, images, availability, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.slug)
        .bind(input.title.trim())
        .bind(input.brand.trim())
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.images)
        .bind(input.availability.as_deref())
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "slug"))?;
        Ok(row)
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE store.product
            SET slug = $2, title = $3, brand = $4, category = $5, description = $6,
                price = $7, stock = $8, images = $9, availability = $10, is_active = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.slug)
        .bind(input.title.trim())
        .bind(input.brand.trim())
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.images)
        .bind(input.availability.as_deref())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "slug"))?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row)
    }

    /// Hide a product from the storefront. Order history keeps referencing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE store.product SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add `delta` to the stock and return the new level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if stock would go below zero.
    pub async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<i32, RepositoryError> {
        let stock: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE store.product
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            RETURNING stock
            ",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(self.pool)
        .await?;

        if let Some(stock) = stock {
            return Ok(stock);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM store.product WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        if exists {
            Err(RepositoryError::Conflict(
                "stock cannot go below zero".to_string(),
            ))
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Upsert every product by slug in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any upsert fails; nothing is written then.
    pub async fn sync(&self, products: &[ProductInput]) -> Result<SyncReport, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut report = SyncReport::default();

        for product in products {
            if upsert(&mut tx, product).await? {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
        }

        tx.commit().await?;
        Ok(report)
    }
}
