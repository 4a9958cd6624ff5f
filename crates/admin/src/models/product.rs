//! Catalog management types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solewave_core::ProductId;

/// Longest slug accepted.
const MAX_SLUG_LENGTH: usize = 120;

/// A product row, active or not.
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

fn default_category() -> String {
    "sneakers".to_string()
}

const fn default_active() -> bool {
    true
}

/// Product fields accepted on create, update, sync and YAML seeding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductInput {
    pub slug: String,
    pub title: String,
    pub brand: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl ProductInput {
    /// Check field rules before writing.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        let slug_ok = !self.slug.is_empty()
            && self.slug.len() <= MAX_SLUG_LENGTH
            && self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err(format!(
                "slug must be 1 to {MAX_SLUG_LENGTH} characters of a-z, 0-9 and '-'"
            ));
        }
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.brand.trim().is_empty() {
            return Err("brand is required".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("price cannot be negative".to_string());
        }
        if self.stock < 0 {
            return Err("stock cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Result of a bulk upsert by slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: u64,
    pub updated: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        serde_json::from_str(
            r#"{"slug":"court-low-white","title":"Court Low","brand":"Solewave","price":"129.00","stock":4}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let p = input();
        assert_eq!(p.category, "sneakers");
        assert!(p.is_active);
        assert!(p.images.is_empty());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut p = input();
        p.slug = "Court Low".to_string();
        assert!(p.validate().unwrap_err().starts_with("slug"));

        let mut p = input();
        p.price = Decimal::new(-1, 2);
        assert_eq!(p.validate().unwrap_err(), "price cannot be negative");

        let mut p = input();
        p.stock = -3;
        assert_eq!(p.validate().unwrap_err(), "stock cannot be negative");

        let mut p = input();
        p.brand = "  ".to_string();
        assert_eq!(p.validate().unwrap_err(), "brand is required");
    }
}
