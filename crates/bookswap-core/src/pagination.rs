//! Page-based pagination.
//!
//! List endpoints accept `page` (1-indexed) and `limit` query parameters and
//! answer with a [`PaginationMeta`] block:
//!
//! ```json
//! {
//!   "pagination": {
//!     "total_items": 42,
//!     "current_page": 2,
//!     "page_size": 20,
//!     "total_pages": 3,
//!     "has_more": true
//!   }
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page number honoured; larger requests get this (empty) page.
pub const MAX_PAGE: i64 = 1_000_000;

/// Deserializes a loosely formatted query value into an optional i64.
///
/// Empty or unparseable values become `None` so they fall back to the
/// defaults instead of rejecting the request.
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.and_then(|s| s.trim().parse::<i64>().ok()))
}

/// Query parameters for page-based pagination.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, Deserialize, ToSchema)]
pub struct PageParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 20)
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub limit: Option<i64>,
}

impl PageParams {
    /// Effective page, clamped to [1, `MAX_PAGE`]. Zero and missing values
    /// mean page 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        match self.page {
            None | Some(0) => 1,
            Some(p) => p.clamp(1, MAX_PAGE),
        }
    }

    /// Effective page size, clamped to [1, 100]. Zero and missing values
    /// mean the default of 20.
    #[must_use]
    pub fn limit(&self) -> i64 {
        match self.limit {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(l) => l.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching items across all pages
    pub total_items: i64,
    /// Current page number (1-indexed)
    pub current_page: i64,
    /// Items per page
    pub page_size: i64,
    /// Number of pages needed for `total_items`
    pub total_pages: i64,
    /// Whether a page exists after this one
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total_items: i64, current_page: i64, page_size: i64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = (total_items + page_size - 1) / page_size;

        Self {
            total_items,
            current_page,
            page_size,
            total_pages,
            has_more: current_page < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PageParams {
        PageParams { page, limit }
    }

    #[test]
    fn test_defaults() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_zero_falls_back_to_defaults() {
        let p = params(Some(0), Some(0));
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(params(None, Some(500)).limit(), 100);
        assert_eq!(params(None, Some(-3)).limit(), 1);
    }

    #[test]
    fn test_negative_page_is_first_page() {
        assert_eq!(params(Some(-2), None).page(), 1);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let p = params(Some(i64::MAX), Some(100));
        assert_eq!(p.page(), MAX_PAGE);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn test_offset_from_page() {
        assert_eq!(params(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn test_lenient_query_parsing() {
        let p: PageParams = serde_json::from_str(r#"{"page": "abc", "limit": ""}"#).unwrap();
        assert_eq!(p, PageParams::default());

        let p: PageParams = serde_json::from_str(r#"{"page": " 2 ", "limit": "5"}"#).unwrap();
        assert_eq!(p, params(Some(2), Some(5)));
    }

    #[test]
    fn test_meta_math() {
        let meta = PaginationMeta::new(41, 2, 20);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);

        let last = PaginationMeta::new(41, 3, 20);
        assert!(!last.has_more);

        let empty = PaginationMeta::new(0, 1, 20);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }
}
