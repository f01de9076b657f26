//! # Pagination
//!
//! Page arithmetic for catalog listings.
//!
//! Pages are 1-based. A `Pager` is plain state owned by the caller; it never
//! sees the items themselves, only their count.

use crate::primitives::{DEFAULT_PAGE_SIZE, MAX_VISIBLE_PAGES};

/// Current page and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    per_page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// 1-based bounds of the items shown on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    pub last: usize,
    pub total: usize,
}

/// The numbered page buttons to render around the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    /// Consecutive page numbers, at most `MAX_VISIBLE_PAGES`.
    pub pages: Vec<usize>,
    /// Render a separate button for page 1.
    pub show_first: bool,
    /// Render "..." between page 1 and the window.
    pub leading_ellipsis: bool,
    /// Render a separate button for the last page.
    pub show_last: bool,
    /// Render "..." between the window and the last page.
    pub trailing_ellipsis: bool,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pager {
    /// A pager on page 1. A zero page size falls back to the default.
    #[must_use]
    pub fn new(per_page: usize) -> Self {
        Self {
            page: 1,
            per_page: if per_page == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                per_page
            },
        }
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages for `len` items.
    #[must_use]
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.per_page)
    }

    /// The items on the current page.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.per_page).min(items.len());
        let end = start.saturating_add(self.per_page).min(items.len());
        &items[start..end]
    }

    /// "Showing first-last of total", or `None` when there is nothing.
    #[must_use]
    pub fn range_info(&self, len: usize) -> Option<PageRange> {
        if len == 0 {
            return None;
        }
        let first = (self.page - 1) * self.per_page + 1;
        if first > len {
            return None;
        }
        Some(PageRange {
            first,
            last: (self.page * self.per_page).min(len),
            total: len,
        })
    }

    /// Pull the page back in range after items were removed.
    pub fn clamp(&mut self, len: usize) {
        let total = self.total_pages(len);
        if total == 0 {
            self.page = 1;
        } else if self.page > total {
            self.page = total;
        }
    }

    /// Jump to the last page, as after adding an item.
    pub fn go_to_last(&mut self, len: usize) {
        self.page = self.total_pages(len).max(1);
    }

    /// Change the page size and return to page 1.
    pub fn set_per_page(&mut self, per_page: usize) {
        *self = Self::new(per_page);
    }

    /// Move to `page`, clamped to the valid range for `len` items.
    pub fn go_to(&mut self, page: usize, len: usize) {
        self.page = page.clamp(1, self.total_pages(len).max(1));
    }

    /// The page buttons to show, or `None` when there is at most one page.
    ///
    /// The window is centred on the current page and shifted left near the
    /// end so it always shows `MAX_VISIBLE_PAGES` buttons when enough pages
    /// exist.
    #[must_use]
    pub fn window(&self, len: usize) -> Option<PageWindow> {
        let total = self.total_pages(len);
        if total <= 1 {
            return None;
        }
        let current = self.page.min(total);

        let span = MAX_VISIBLE_PAGES - 1;
        let mut start = current.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
        let end = (start + span).min(total);
        if end - start < span {
            start = end.saturating_sub(span).max(1);
        }

        Some(PageWindow {
            pages: (start..=end).collect(),
            show_first: start > 1,
            leading_ellipsis: start > 2,
            show_last: end < total,
            trailing_ellipsis: end + 1 < total,
            has_prev: current > 1,
            has_next: current < total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let pager = Pager::default();
        assert_eq!(pager.total_pages(0), 0);
        assert_eq!(pager.total_pages(5), 1);
        assert_eq!(pager.total_pages(6), 2);
    }

    #[test]
    fn slice_and_range_info() {
        let items: Vec<u32> = (1..=12).collect();
        let mut pager = Pager::default();
        pager.go_to(3, items.len());

        assert_eq!(pager.slice(&items), &[11, 12]);
        assert_eq!(
            pager.range_info(items.len()),
            Some(PageRange {
                first: 11,
                last: 12,
                total: 12
            })
        );
        assert_eq!(pager.range_info(0), None);
    }

    #[test]
    fn clamp_after_deleting_last_item_on_page() {
        let mut pager = Pager::default();
        pager.go_to(3, 11);
        assert_eq!(pager.page(), 3);

        pager.clamp(10);
        assert_eq!(pager.page(), 2);

        pager.clamp(0);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn go_to_last_after_insert() {
        let mut pager = Pager::default();
        pager.go_to_last(11);
        assert_eq!(pager.page(), 3);
        pager.go_to_last(0);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn set_per_page_resets_to_first_page() {
        let mut pager = Pager::default();
        pager.go_to(2, 20);
        pager.set_per_page(10);
        assert_eq!((pager.page(), pager.per_page()), (1, 10));
    }

    #[test]
    fn single_page_has_no_window() {
        assert_eq!(Pager::default().window(5), None);
    }

    #[test]
    fn window_at_start() {
        let window = Pager::default().window(50).expect("window");
        assert_eq!(window.pages, vec![1, 2, 3, 4, 5]);
        assert!(!window.show_first);
        assert!(window.show_last);
        assert!(window.trailing_ellipsis);
        assert!(!window.has_prev);
        assert!(window.has_next);
    }

    #[test]
    fn window_centred_in_middle() {
        let mut pager = Pager::default();
        pager.go_to(6, 50);
        let window = pager.window(50).expect("window");
        assert_eq!(window.pages, vec![4, 5, 6, 7, 8]);
        assert!(window.show_first && window.leading_ellipsis);
        assert!(window.show_last && window.trailing_ellipsis);
    }

    #[test]
    fn window_shifted_near_end() {
        let mut pager = Pager::default();
        pager.go_to(10, 50);
        let window = pager.window(50).expect("window");
        assert_eq!(window.pages, vec![6, 7, 8, 9, 10]);
        assert!(!window.show_last);
        assert!(!window.has_next);
    }

    #[test]
    fn window_with_few_pages() {
        let mut pager = Pager::default();
        pager.go_to(2, 12);
        let window = pager.window(12).expect("window");
        assert_eq!(window.pages, vec![1, 2, 3]);
        assert!(!window.show_first && !window.show_last);
    }
}
