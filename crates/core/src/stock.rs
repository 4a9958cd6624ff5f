//! Stock level labels shared by the catalog and the back-office dashboard.

/// Stock level at or below which a product counts as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Availability label derived from the units on hand.
#[must_use]
pub const fn stock_label(stock: i32) -> &'static str {
    if stock <= 0 {
        "sold_out"
    } else if stock <= LOW_STOCK_THRESHOLD {
        "low_stock"
    } else {
        "in_stock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_labels() {
        assert_eq!(stock_label(-2), "sold_out");
        assert_eq!(stock_label(0), "sold_out");
        assert_eq!(stock_label(1), "low_stock");
        assert_eq!(stock_label(LOW_STOCK_THRESHOLD), "low_stock");
        assert_eq!(stock_label(LOW_STOCK_THRESHOLD + 1), "in_stock");
    }
}
