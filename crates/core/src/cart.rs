//! Session cart.
//!
//! The cart is a plain value serialized into the visitor's session. Lines are
//! keyed by product and size; adding the same pair twice merges quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProductId, round_cents};

/// Maximum quantity of one product/size in a cart.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Maximum number of distinct lines in a cart.
pub const MAX_CART_LINES: usize = 50;

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantity of zero passed to `add`.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The line would exceed [`MAX_LINE_QUANTITY`].
    #[error("at most {MAX_LINE_QUANTITY} of one item per order")]
    LineQuantityExceeded,
    /// The cart already has [`MAX_CART_LINES`] lines.
    #[error("cart is full")]
    TooManyLines,
    /// No line for this product and size.
    #[error("item not in cart")]
    LineNotFound,
}

/// One product/size entry in the cart, with a price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub title: String,
    pub brand: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`, rounded to cents.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_cents(self.unit_price * Decimal::from(self.quantity))
    }

    fn matches(&self, product_id: ProductId, size: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Current quantity for a product/size, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId, size: Option<&str>) -> u32 {
        self.lines
            .iter()
            .find(|l| l.matches(product_id, size))
            .map_or(0, |l| l.quantity)
    }

    /// Total quantity of a product across all sizes.
    #[must_use]
    pub fn product_quantity(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Add `line`, merging with an existing line for the same product and size.
    ///
    /// The price snapshot of a merged line is refreshed from `line`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the quantity is zero, the merged quantity would
    /// exceed [`MAX_LINE_QUANTITY`], or a new line would exceed [`MAX_CART_LINES`].
    pub fn add(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(line.product_id, line.size.as_deref()))
        {
            let merged = existing.quantity + line.quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(CartError::LineQuantityExceeded);
            }
            existing.quantity = merged;
            existing.unit_price = line.unit_price;
            existing.title = line.title;
            existing.image = line.image;
            return Ok(());
        }

        if line.quantity > MAX_LINE_QUANTITY {
            return Err(CartError::LineQuantityExceeded);
        }
        if self.lines.len() >= MAX_CART_LINES {
            return Err(CartError::TooManyLines);
        }
        self.lines.push(line);
        Ok(())
    }

    /// Set the quantity of a line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line, or
    /// [`CartError::LineQuantityExceeded`] above [`MAX_LINE_QUANTITY`].
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id, size);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::LineQuantityExceeded);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, size))
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if there is no such line.
    pub fn remove(&mut self, product_id: ProductId, size: Option<&str>) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, size));
        if self.lines.len() == before {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn line(id: i64, size: Option<&str>, price: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            size: size.map(str::to_owned),
            title: format!("Runner {id}"),
            brand: "Solewave".to_owned(),
            image: None,
            unit_price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_add_merges_same_product_and_size() {
        let mut cart = Cart::new();
        cart.add(line(1, Some("10"), "120.00", 1)).unwrap();
        cart.add(line(1, Some("10"), "110.00", 2)).unwrap();
        cart.add(line(1, Some("11"), "110.00", 1)).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.quantity_of(ProductId::new(1), Some("10")), 3);
        assert_eq!(cart.lines()[0].unit_price, "110.00".parse::<Decimal>().unwrap());
        assert_eq!(cart.product_quantity(ProductId::new(1)), 4);
    }

    #[test]
    fn test_add_caps_line_quantity() {
        let mut cart = Cart::new();
        cart.add(line(1, None, "10", 9)).unwrap();
        assert_eq!(
            cart.add(line(1, None, "10", 2)),
            Err(CartError::LineQuantityExceeded)
        );
        assert_eq!(cart.quantity_of(ProductId::new(1), None), 9);
        assert_eq!(cart.add(line(2, None, "10", 0)), Err(CartError::ZeroQuantity));
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for id in 0..i64::try_from(MAX_CART_LINES).unwrap() {
            cart.add(line(id, None, "1", 1)).unwrap();
        }
        assert_eq!(cart.add(line(999, None, "1", 1)), Err(CartError::TooManyLines));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add(line(1, Some("9"), "50", 2)).unwrap();
        cart.update_quantity(ProductId::new(1), Some("9"), 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(
            cart.update_quantity(ProductId::new(1), Some("9"), 1),
            Err(CartError::LineNotFound)
        );
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add(line(1, None, "19.99", 3)).unwrap();
        cart.add(line(2, None, "5.01", 1)).unwrap();
        assert_eq!(cart.subtotal(), "64.98".parse::<Decimal>().unwrap());
        assert_eq!(cart.item_count(), 4);
        cart.clear();
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_serde_roundtrip_preserves_lines() {
        let mut cart = Cart::new();
        cart.add(line(7, Some("8.5"), "140", 1)).unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
