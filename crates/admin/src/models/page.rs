//! Paging for admin listings.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 200;

/// `?page=&per_page=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Normalized paging: `page >= 1`, `per_page` in `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub per_page: u32,
}

impl From<PageQuery> for Paging {
    fn from(query: PageQuery) -> Self {
        Self {
            page: query.page.unwrap_or(1).max(1),
            per_page: query
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }
}

impl Paging {
    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assemble a page, computing `total_pages` from `total`.
    #[must_use]
    pub fn new(items: Vec<T>, paging: Paging, total: i64) -> Self {
        let per = i64::from(paging.per_page.max(1));
        Self {
            items,
            page: paging.page,
            per_page: paging.per_page,
            total,
            total_pages: (total + per - 1) / per,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_normalization() {
        let paging = Paging::from(PageQuery::default());
        assert_eq!(paging, Paging { page: 1, per_page: DEFAULT_PER_PAGE });

        let paging = Paging::from(PageQuery {
            page: Some(0),
            per_page: Some(10_000),
        });
        assert_eq!(paging.page, 1);
        assert_eq!(paging.per_page, MAX_PER_PAGE);

        let paging = Paging::from(PageQuery {
            page: Some(3),
            per_page: Some(20),
        });
        assert_eq!(paging.offset(), 40);
        assert_eq!(paging.limit(), 20);
    }

    #[test]
    fn test_total_pages() {
        let paging = Paging { page: 1, per_page: 50 };
        assert_eq!(Page::<()>::new(vec![], paging, 0).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], paging, 50).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], paging, 51).total_pages, 2);
    }
}
