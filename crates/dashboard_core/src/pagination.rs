//! Page arithmetic shared by the table view-state and renderers.

/// Number of page links shown on each side of the current page.
pub const WINDOW_RADIUS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn offset_for(page_index: u32, page_size: u32) -> u64 {
    u64::from(page_index.saturating_sub(1)) * u64::from(page_size)
}

/// Compact navigation strip around `page_index`: first and last page are
/// always reachable, skipped runs collapse into an ellipsis.
pub fn visible_page_window(page_index: u32, total_pages: u32) -> Vec<PageLink> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = page_index.clamp(1, total_pages);
    let start = current.saturating_sub(WINDOW_RADIUS).max(1);
    let end = current.saturating_add(WINDOW_RADIUS).min(total_pages);

    let mut links = Vec::with_capacity((end - start + 5) as usize);
    if start > 1 {
        links.push(PageLink::Page(1));
    }
    if start > 2 {
        links.push(PageLink::Ellipsis);
    }
    links.extend((start..=end).map(PageLink::Page));
    if end < total_pages.saturating_sub(1) {
        links.push(PageLink::Ellipsis);
    }
    if end < total_pages {
        links.push(PageLink::Page(total_pages));
    }
    links
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
