//! Status enums for the storefront entities.
//!
//! Each enum maps 1:1 onto a Postgres enum in the `store` schema and onto the
//! `snake_case` strings used in the JSON API.

use serde::{Deserialize, Serialize};

/// Error returned when a status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `Display`, `FromStr` and `as_str` from a variant/string table.
macro_rules! status_strings {
    ($ty:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire and database spelling of this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

pub(crate) use status_strings;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper.
    #[default]
    Customer,
    /// Affiliate with a coupon code and commission tier.
    Creator,
    /// Back-office access.
    Admin,
}

status_strings!(Role, "role", {
    Customer => "customer",
    Creator => "creator",
    Admin => "admin",
});

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

status_strings!(OrderStatus, "order status", {
    Pending => "pending",
    Paid => "paid",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl OrderStatus {
    /// Statuses whose orders count as revenue and earn commission.
    pub const SALES: &'static [Self] = &[Self::Paid, Self::Shipped, Self::Delivered];

    /// Whether an order in this status counts as a completed sale.
    #[must_use]
    pub const fn counts_as_sale(self) -> bool {
        matches!(self, Self::Paid | Self::Shipped | Self::Delivered)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// Whether the goods are still in the warehouse, so cancelling or
    /// refunding puts them back into stock.
    #[must_use]
    pub const fn restocks_on_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    /// Whether `self -> next` is an allowed transition.
    ///
    /// ```text
    /// pending -> paid | cancelled
    /// paid    -> shipped | cancelled | refunded
    /// shipped -> delivered | refunded
    /// delivered -> refunded
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Cancelled)
                | (Self::Paid, Self::Shipped | Self::Cancelled | Self::Refunded)
                | (Self::Shipped, Self::Delivered | Self::Refunded)
                | (Self::Delivered, Self::Refunded)
        )
    }
}

/// Creator invite status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.invite_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    #[default]
    Pending,
    Accepted,
    Revoked,
    Expired,
}

status_strings!(InviteStatus, "invite status", {
    Pending => "pending",
    Accepted => "accepted",
    Revoked => "revoked",
    Expired => "expired",
});

/// Social verification review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.verification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

status_strings!(VerificationStatus, "verification status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Social network a creator verifies followers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.social_platform", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Instagram,
    Tiktok,
    Youtube,
    Twitter,
}

status_strings!(SocialPlatform, "social platform", {
    Instagram => "instagram",
    Tiktok => "tiktok",
    Youtube => "youtube",
    Twitter => "twitter",
});

/// Kind of wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.transaction_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credits bought with a card payment.
    TopUp,
    /// Manual adjustment by an admin (may be negative).
    Grant,
    /// One-off bonus for an approved social verification.
    VerificationBonus,
    /// Creator commission converted into credits.
    CommissionPayout,
    /// Credits spent at checkout.
    Redemption,
    /// Credits returned after a cancelled checkout.
    Refund,
}

status_strings!(TransactionType, "transaction type", {
    TopUp => "top_up",
    Grant => "grant",
    VerificationBonus => "verification_bonus",
    CommissionPayout => "commission_payout",
    Redemption => "redemption",
    Refund => "refund",
});

/// Wallet ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.transaction_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

status_strings!(TransactionStatus, "transaction status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transition_table() {
        use OrderStatus::{Cancelled, Delivered, Paid, Pending, Refunded, Shipped};

        let allowed = [
            (Pending, Paid),
            (Pending, Cancelled),
            (Paid, Shipped),
            (Paid, Cancelled),
            (Paid, Refunded),
            (Shipped, Delivered),
            (Shipped, Refunded),
            (Delivered, Refunded),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = allowed.contains(&(*from, *to));
                assert_eq!(
                    from.can_transition_to(*to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for status in OrderStatus::ALL.iter().filter(|s| s.is_terminal()) {
            assert!(OrderStatus::ALL.iter().all(|n| !status.can_transition_to(*n)));
        }
    }

    #[test]
    fn test_sales_statuses() {
        let sales: Vec<_> = OrderStatus::ALL
            .iter()
            .copied()
            .filter(|s| s.counts_as_sale())
            .collect();
        assert_eq!(sales, OrderStatus::SALES);
    }

    #[test]
    fn test_string_roundtrip() {
        for t in TransactionType::ALL {
            assert_eq!(t.as_str().parse::<TransactionType>().unwrap(), *t);
        }
        assert_eq!("verification_bonus".parse(), Ok(TransactionType::VerificationBonus));
        assert_eq!(
            serde_json::to_string(&TransactionType::CommissionPayout).unwrap(),
            "\"commission_payout\""
        );
    }

    #[test]
    fn test_parse_error_names_kind() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "invalid role: superuser");
    }
}
