//! Fixed-size pages and the page selector window

use serde::Serialize;

/// One slot in a page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Number of pages needed for `total_items`; an empty list still has one page
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total_items.div_ceil(page_size).max(1)
}

/// Clamp a 1-based page number into range
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Page numbers to show in a selector.
///
/// Up to `threshold` pages (never fewer than 7) are listed in full. Beyond
/// that the first and last pages stay visible and the rest collapses around
/// the current page.
pub fn page_window(current: usize, total: usize, threshold: usize) -> Vec<PageItem> {
    if total <= threshold.max(7) {
        return (1..=total.max(1)).map(PageItem::Page).collect();
    }

    let current = clamp_page(current, total);
    let mut items = Vec::new();

    if current <= 4 {
        items.extend((1..=5).map(PageItem::Page));
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
    } else if current + 3 >= total {
        items.push(PageItem::Page(1));
        items.push(PageItem::Ellipsis);
        items.extend((total - 4..=total).map(PageItem::Page));
    } else {
        items.push(PageItem::Page(1));
        items.push(PageItem::Ellipsis);
        items.extend((current - 1..=current + 1).map(PageItem::Page));
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
    }

    items
}

/// Rows of a 1-based page
pub fn paginate<T>(rows: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    let page_size = page_size.max(1);
    let start = (page.max(1) - 1).saturating_mul(page_size);
    rows.into_iter().skip(start).take(page_size).collect()
}

#[cfg(test)]
mod tests {
    use super::PageItem::{Ellipsis, Page};
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_small_counts_list_every_page() {
        assert_eq!(page_window(1, 1, 7), vec![Page(1)]);
        assert_eq!(
            page_window(3, 7, 7),
            (1..=7).map(Page).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_window_near_start() {
        assert_eq!(
            page_window(2, 20, 7),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn test_window_near_end() {
        assert_eq!(
            page_window(18, 20, 7),
            vec![Page(1), Ellipsis, Page(16), Page(17), Page(18), Page(19), Page(20)]
        );
    }

    #[test]
    fn test_window_in_middle() {
        assert_eq!(
            page_window(10, 20, 7),
            vec![Page(1), Ellipsis, Page(9), Page(10), Page(11), Ellipsis, Page(20)]
        );
    }

    #[test]
    fn test_paginate() {
        let rows: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(rows.clone(), 3, 10), vec![21, 22, 23, 24, 25]);
        assert!(paginate(rows, 4, 10).is_empty());
    }

    #[test]
    fn test_paginate_far_past_the_end() {
        let rows: Vec<u32> = (1..=25).collect();
        assert!(paginate(rows, usize::MAX, 10).is_empty());
    }
}
