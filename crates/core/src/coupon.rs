//! Creator coupon codes.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::round_cents;

/// Largest customer discount a coupon may carry, in percent.
pub const MAX_DISCOUNT_PERCENT: i32 = 50;

/// Discount applied when an invite does not specify one.
pub const DEFAULT_DISCOUNT_PERCENT: i32 = 10;

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponCodeError {
    /// Shorter than [`CouponCode::MIN_LENGTH`].
    #[error("coupon code must be at least {} characters", CouponCode::MIN_LENGTH)]
    TooShort,
    /// Longer than [`CouponCode::MAX_LENGTH`].
    #[error("coupon code must be at most {} characters", CouponCode::MAX_LENGTH)]
    TooLong,
    /// Contains something other than `A-Z`, `0-9`, `_` or `-`.
    #[error("coupon code may only contain letters, digits, '_' and '-'")]
    InvalidCharacter,
}

/// A normalized (uppercase) coupon code, e.g. `KICKSBYJAY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// Minimum code length.
    pub const MIN_LENGTH: usize = 3;
    /// Maximum code length.
    pub const MAX_LENGTH: usize = 20;

    /// Parse and normalize a coupon code.
    ///
    /// # Errors
    ///
    /// Returns [`CouponCodeError`] if the trimmed input has the wrong length or
    /// contains characters outside `A-Z 0-9 _ -`.
    pub fn parse(s: &str) -> Result<Self, CouponCodeError> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() < Self::MIN_LENGTH {
            return Err(CouponCodeError::TooShort);
        }
        if code.len() > Self::MAX_LENGTH {
            return Err(CouponCodeError::TooLong);
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(CouponCodeError::InvalidCharacter);
        }
        Ok(Self(code))
    }

    /// Build a code from a name and a numeric suffix, e.g. `("Jay Kicks", 42)` -> `JAYKICKS42`.
    ///
    /// Non-alphanumeric characters are dropped and the name part is cut to 12
    /// characters. Names with no usable characters fall back to `CREATOR`.
    #[must_use]
    pub fn suggest(name: &str, suffix: u32) -> Self {
        let mut stem: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(12)
            .collect::<String>()
            .to_ascii_uppercase();
        if stem.is_empty() {
            stem.push_str("CREATOR");
        }
        Self(format!("{stem}{}", suffix % 10_000))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

/// Clamp a discount percentage into `0..=MAX_DISCOUNT_PERCENT`.
#[must_use]
pub fn clamp_discount_percent(percent: i32) -> i32 {
    percent.clamp(0, MAX_DISCOUNT_PERCENT)
}

/// Discount in dollars for `percent` off `subtotal`, rounded to cents.
#[must_use]
pub fn apply_discount(subtotal: Decimal, percent: i32) -> Decimal {
    if subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let pct = Decimal::from(clamp_discount_percent(percent));
    round_cents(subtotal * pct / Decimal::from(100)).min(subtotal)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(CouponCode::parse(" jay-kicks ").unwrap().as_str(), "JAY-KICKS");
        assert_eq!(CouponCode::parse("drop_10").unwrap().as_str(), "DROP_10");
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(CouponCode::parse("ab"), Err(CouponCodeError::TooShort));
        assert_eq!(
            CouponCode::parse(&"X".repeat(21)),
            Err(CouponCodeError::TooLong)
        );
        assert_eq!(
            CouponCode::parse("save 10"),
            Err(CouponCodeError::InvalidCharacter)
        );
        assert_eq!(
            CouponCode::parse("café"),
            Err(CouponCodeError::InvalidCharacter)
        );
    }

    #[test]
    fn test_suggest() {
        assert_eq!(CouponCode::suggest("Jay Kicks!", 42).as_str(), "JAYKICKS42");
        assert_eq!(
            CouponCode::suggest("supercalifragilistic", 7).as_str(),
            "SUPERCALIFRA7"
        );
        assert_eq!(CouponCode::suggest("!!!", 1).as_str(), "CREATOR1");
        assert!(CouponCode::parse(CouponCode::suggest("a.b@c", 99_999).as_str()).is_ok());
    }

    #[test]
    fn test_apply_discount() {
        assert_eq!(apply_discount(d("189.99"), 10), d("19.00"));
        assert_eq!(apply_discount(d("100"), 80), d("50.00"));
        assert_eq!(apply_discount(d("100"), -5), Decimal::ZERO);
        assert_eq!(apply_discount(Decimal::ZERO, 10), Decimal::ZERO);
    }
}
