//! Catalog seeding from YAML.
//!
//! ```yaml
//! products:
//!   - slug: court-low-white
//!     title: Court Low
//!     brand: Solewave
//!     price: "129.00"
//!     stock: 24
//!     images: ["/uploads/court-low-white.webp"]
//! ```
//!
//! Products are upserted by slug in one transaction, so re-running a file is
//! safe and a bad row leaves the catalog untouched.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use solewave_admin::db::ProductRepository;
use solewave_admin::models::ProductInput;

/// Top-level YAML document.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<ProductInput>,
}

/// Validation messages for every invalid product, with its slug.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors: Vec<String> = catalog
        .products
        .iter()
        .filter_map(|p| p.validate().err().map(|e| format!("{}: {e}", p.slug)))
        .collect();

    let mut slugs: Vec<&str> = catalog.products.iter().map(|p| p.slug.as_str()).collect();
    slugs.sort_unstable();
    for pair in slugs.windows(2) {
        if let [a, b] = pair
            && a == b
        {
            errors.push(format!("{a}: duplicate slug"));
        }
    }
    errors
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any product is
/// invalid, or the database write fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }
    info!(products = catalog.products.len(), "Catalog validated");

    let pool = super::connect().await?;
    let report = ProductRepository::new(&pool)
        .sync(&catalog.products)
        .await?;

    info!(
        inserted = report.inserted,
        updated = report.updated,
        "Seeding complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
products:
  - slug: court-low-white
    title: Court Low
    brand: Solewave
    price: "129.00"
    stock: 24
  - slug: trail-runner-olive
    title: Trail Runner
    brand: Solewave
    category: running
    price: "149.50"
"#;

    #[test]
    fn test_parses_catalog_with_defaults() {
        let catalog: CatalogFile = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].category, "sneakers");
        assert_eq!(catalog.products[1].category, "running");
        assert_eq!(catalog.products[1].stock, 0);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_reports_duplicates_and_invalid_rows() {
        let mut catalog: CatalogFile = serde_yaml::from_str(CATALOG).unwrap();
        let mut dup = catalog.products[0].clone();
        dup.stock = -1;
        catalog.products.push(dup);

        let errors = validate_catalog(&catalog);
        assert!(errors.contains(&"court-low-white: stock cannot be negative".to_string()));
        assert!(errors.contains(&"court-low-white: duplicate slug".to_string()));
    }
}
