//! Page requests and paged results.
//!
//! List operations never fail on out-of-range pagination: page numbers are
//! floored at 1 and page sizes clamped into `[PAGE_SIZE_MIN, PAGE_SIZE_MAX]`.
//! Only the search endpoint rejects out-of-range values, and it does so at the
//! HTTP boundary before reaching a repository.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: defaults::PAGE_NUMBER,
            page_size: defaults::PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Copy with page number floored at 1 and size clamped into bounds.
    pub fn clamped(self) -> Self {
        Self {
            page_number: self.page_number.max(defaults::PAGE_NUMBER),
            page_size: self
                .page_size
                .clamp(defaults::PAGE_SIZE_MIN, defaults::PAGE_SIZE_MAX),
        }
    }

    /// SQL `LIMIT` for the clamped request.
    pub fn limit(&self) -> i64 {
        self.clamped().page_size
    }

    /// SQL `OFFSET` for the clamped request.
    pub fn offset(&self) -> i64 {
        let c = self.clamped();
        (c.page_number - 1).saturating_mul(c.page_size)
    }
}

/// One page of results plus the pre-pagination total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Build a page; the echoed page number and size are the clamped values.
    pub fn new(items: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        let c = request.clamped();
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + c.page_size - 1) / c.page_size
        };
        Self {
            items,
            total_count,
            page_number: c.page_number,
            page_size: c.page_size,
            total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_and_zero_are_clamped() {
        let c = PageRequest::new(-1, 0).clamped();
        assert_eq!(c.page_number, 1);
        assert_eq!(c.page_size, 1);
    }

    #[test]
    fn test_oversized_page_clamped_to_max() {
        let c = PageRequest::new(3, 10_000).clamped();
        assert_eq!(c.page_size, defaults::PAGE_SIZE_MAX);
        assert_eq!(c.page_number, 3);
    }

    #[test]
    fn test_limit_never_zero() {
        for size in [-5, 0, 1, 50, 100, 101] {
            assert!(PageRequest::new(1, size).limit() >= 1);
        }
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
    }

    #[test]
    fn test_offset_does_not_overflow() {
        let req = PageRequest::new(i64::MAX, 100);
        assert_eq!(req.offset(), i64::MAX);
    }

    #[test]
    fn test_page_total_pages() {
        let page: Page<i32> = Page::new(vec![1, 2], 41, PageRequest::new(1, 20));
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::empty(PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.total_count, 0);
    }

    #[test]
    fn test_page_echoes_clamped_values() {
        let page: Page<i32> = Page::new(vec![], 0, PageRequest::new(-4, 0));
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 1);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(vec!["a"], 1, PageRequest::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["pageNumber"], 1);
        assert_eq!(json["pageSize"], 20);
        assert_eq!(json["totalPages"], 1);
    }
}
