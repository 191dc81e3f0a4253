use serde::Deserialize;
use serde::Serialize;

use crate::error::ApiError;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A 1-based page request; page-size is clamped to `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Page-size 0 is rejected, 101+ is clamped to 100, negative page is
    /// rejected.
    pub fn validated(self) -> Result<ValidPage, ApiError> {
        if self.page < 1 {
            return Err(ApiError::validation("page must be >= 1"));
        }
        if self.page_size == 0 {
            return Err(ApiError::validation("page_size must be >= 1"));
        }
        let page_size = self.page_size.min(MAX_PAGE_SIZE);
        Ok(ValidPage {
            page: self.page,
            page_size,
        })
    }
}

/// A `PageRequest` that has already passed `validated()`. Repository
/// implementations accept only this type so an unchecked page request can
/// never reach a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidPage {
    pub page: i64,
    pub page_size: u32,
}

impl ValidPage {
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * i64::from(self.page_size)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: ValidPage, total_items: i64) -> Self {
        let page_size = i64::from(page.page_size);
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };
        Self {
            items,
            page: page.page,
            page_size: page.page_size,
            total_items,
            total_pages,
            has_next: page.page < total_pages,
            has_prev: page.page > 1,
        }
    }

    /// Applies an in-memory page to an already-filtered, stably-ordered
    /// collection. Reference/test repositories use this instead of a real
    /// SQL `OFFSET`/`LIMIT`.
    #[must_use]
    pub fn slice(all: Vec<T>, page: ValidPage) -> Self {
        let total_items = all.len() as i64;
        let offset = page.offset().max(0) as usize;
        let items = if offset >= all.len() {
            Vec::new()
        } else {
            let end = (offset + page.page_size as usize).min(all.len());
            all[offset..end].to_vec()
        };
        Self::new(items, page, total_items)
    }
}

impl<T: Clone> Paginated<T> {
    #[must_use]
    pub fn slice_ref(all: &[T], page: ValidPage) -> Self {
        Self::slice(all.to_vec(), page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_page_size() {
        let err = PageRequest::new(1, 0).validated().unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn rejects_negative_page() {
        let err = PageRequest::new(-1, 10).validated().unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn clamps_oversized_page_size() {
        let valid = PageRequest::new(1, 101).validated().expect("valid");
        assert_eq!(valid.page_size, 100);
    }

    #[test]
    fn pagination_identity_concatenates_to_full_list() {
        let all: Vec<i32> = (0..25).collect();
        let mut seen = Vec::new();
        let mut total_from_pages = 0i64;
        for page_no in 1..=3 {
            let page = PageRequest::new(page_no, 10).validated().expect("valid");
            let paginated = Paginated::slice(all.clone(), page);
            total_from_pages += paginated.items.len() as i64;
            seen.extend(paginated.items);
        }
        assert_eq!(seen, all);
        assert_eq!(total_from_pages, 25);
    }

    #[test]
    fn page_three_of_twenty_five_has_five_items() {
        let all: Vec<i32> = (0..25).collect();
        let page = PageRequest::new(3, 10).validated().expect("valid");
        let paginated = Paginated::slice(all, page);
        assert_eq!(paginated.items.len(), 5);
        assert_eq!(paginated.total_items, 25);
        assert!(!paginated.has_next);
        assert!(paginated.has_prev);
    }
}
