//! 1-based pagination over ordered listings.
//!
//! # Invariants
//! - A page index below 1 is treated as 1.
//! - A page size below 1 falls back to the configured default; sizes above
//!   the configured maximum are capped.
//! - `index_from == (page_index - 1) * page_size`.
//! - `total_pages == ceil(total_count / page_size)`.

use crate::config::PagingConfig;
use crate::repo::Window;
use serde::{Deserialize, Serialize};

/// Raw page request as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page_index: i64, page_size: i64) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Clamps the request into `(page_index, page_size)` per `config`.
    pub fn normalize(self, config: &PagingConfig) -> (u32, u32) {
        let page_index = u32::try_from(self.page_index.max(1)).unwrap_or(u32::MAX);
        let page_size = if self.page_size < 1 {
            config.default_page_size
        } else {
            u32::try_from(self.page_size).unwrap_or(u32::MAX)
        };
        (page_index, page_size.min(config.max_page_size))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub index_from: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, page_index: u32, page_size: u32, total_count: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(u64::from(page_size))
        };
        Self {
            items,
            page_index,
            page_size,
            total_count,
            total_pages,
            index_from: u64::from(page_index - 1) * u64::from(page_size),
            has_previous_page: page_index > 1,
            has_next_page: u64::from(page_index) < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            index_from: self.index_from,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}

/// Limit/offset window for a normalized page; `None` when the offset
/// overflows, which can only select past the end.
pub(crate) fn page_window(page_index: u32, page_size: u32) -> Option<Window> {
    let offset = u64::from(page_index - 1) * u64::from(page_size);
    u32::try_from(offset).ok().map(|offset| Window {
        limit: page_size,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::{page_window, Page, PageRequest};
    use crate::config::PagingConfig;
    use crate::repo::Window;

    fn config() -> PagingConfig {
        PagingConfig {
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    #[test]
    fn normalize_clamps_index_and_size() {
        assert_eq!(PageRequest::new(0, 0).normalize(&config()), (1, 10));
        assert_eq!(PageRequest::new(-5, -1).normalize(&config()), (1, 10));
        assert_eq!(PageRequest::new(3, 500).normalize(&config()), (3, 100));
        assert_eq!(PageRequest::new(2, 25).normalize(&config()), (2, 25));
    }

    #[test]
    fn twenty_five_rows_split_into_three_pages_of_ten() {
        let first: Page<u8> = Page::new(Vec::new(), 1, 10, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.index_from, 0);
        assert!(!first.has_previous_page);
        assert!(first.has_next_page);

        let last: Page<u8> = Page::new(Vec::new(), 3, 10, 25);
        assert_eq!(last.index_from, 20);
        assert!(last.has_previous_page);
        assert!(!last.has_next_page);

        let beyond: Page<u8> = Page::new(Vec::new(), 4, 10, 25);
        assert!(!beyond.has_next_page);
        assert!(beyond.has_previous_page);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let page: Page<u8> = Page::new(Vec::new(), 1, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_previous_page);
    }

    #[test]
    fn map_keeps_paging_metadata() {
        let page = Page::new(vec![1, 2], 2, 2, 5).map(|value| value * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.index_from, 2);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn window_matches_index_from() {
        assert_eq!(
            page_window(3, 10),
            Some(Window {
                limit: 10,
                offset: 20
            })
        );
        assert_eq!(page_window(u32::MAX, 100), None);
    }
}
