//! Pagination envelope for collection listings.

use serde::Serialize;

/// Upper bound for one page of results.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Position of one page within a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    pub fn new(total: u64, page: u32, size: u32) -> Self {
        let size = size.max(1);
        let total_pages = total.div_ceil(u64::from(size)) as u32;
        Self {
            total,
            page,
            size,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }
}

/// One page of items plus its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::PageInfo;

    #[test]
    fn page_info_computes_navigation_flags() {
        let info = PageInfo::new(25, 2, 10);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_previous);
        assert_eq!(info.offset(), 10);

        let last = PageInfo::new(25, 3, 10);
        assert!(!last.has_next);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let info = PageInfo::new(0, 1, 10);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_previous);
    }
}
