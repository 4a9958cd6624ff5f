//! User and profile views.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solewave_core::tier::CreatorTier;
use solewave_core::{Role, UserId};

use super::{PageQuery, Paging};

/// A user joined with their profile, as listed in the back office.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_creator: bool,
    pub creator_tier: Option<CreatorTier>,
    pub coupon_code: Option<String>,
    pub credits: i64,
    pub follower_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A profile row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_creator: bool,
    pub creator_tier: Option<CreatorTier>,
    pub commission_rate: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub coupon_discount_percent: i32,
    pub credits: i64,
    pub follower_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /api/users` filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive match on email or display name.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl UserFilter {
    /// Normalized paging.
    #[must_use]
    pub fn paging(&self) -> Paging {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .into()
    }

    /// The search term as a `LIKE` pattern, `None` when blank.
    #[must_use]
    pub fn pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)))
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
#[must_use]
pub fn escape_like(s: &str) -> String {
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
    use super::*;

    #[test]
    fn test_search_pattern() {
        let filter = UserFilter {
            q: Some("  jay_k ".to_string()),
            ..UserFilter::default()
        };
        assert_eq!(filter.pattern().as_deref(), Some("%jay\\_k%"));

        let blank = UserFilter {
            role: Some(Role::Creator),
            q: Some("   ".to_string()),
            ..UserFilter::default()
        };
        assert_eq!(blank.pattern(), None);
    }
}
