use crate::models::{Paged, Pagination};

/// Displayed pagination, always a copy of the last accepted server metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub current: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PageState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    /// Page to request after switching to `new_size`, keeping the operator
    /// within range of the current result set.
    pub fn page_for_size(&self, new_size: u32) -> u32 {
        let new_size = u64::from(new_size.max(1));
        let last = self.total.div_ceil(new_size).max(1);
        u64::from(self.current).min(last).max(1) as u32
    }

    /// Whether `page` is a valid jump target that differs from the current page.
    pub fn can_jump_to(&self, page: u32) -> bool {
        page >= 1 && u64::from(page) <= self.total_pages() && page != self.current
    }
}

impl From<Pagination> for PageState {
    fn from(p: Pagination) -> Self {
        Self {
            current: p.page,
            page_size: p.page_size,
            total: p.total_items,
        }
    }
}

/// Identifies one dispatched fetch; only the newest ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// One server-paginated page of rows plus the bookkeeping that keeps a slow,
/// superseded response from overwriting a newer one.
#[derive(Debug, Clone)]
pub struct PagedList<T, S = ()> {
    rows: Vec<T>,
    summary: Option<S>,
    page: PageState,
    dispatched: u64,
}

impl<T, S> PagedList<T, S> {
    pub fn new(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            summary: None,
            page: PageState::new(page_size),
            dispatched: 0,
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn summary(&self) -> Option<&S> {
        self.summary.as_ref()
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    /// Record a new fetch as the latest one.
    pub fn dispatch(&mut self) -> Ticket {
        self.dispatched += 1;
        Ticket(self.dispatched)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.dispatched
    }

    /// Replace the page wholesale with a response. Returns `false` (and
    /// changes nothing) when a newer fetch has been dispatched since.
    pub fn accept(&mut self, ticket: Ticket, response: Paged<T, S>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                "dropping superseded page response (ticket {}, latest {})",
                ticket.0,
                self.dispatched
            );
            return false;
        }
        self.rows = response.data;
        self.summary = response.summary;
        self.page = response.pagination.into();
        true
    }

    /// Clear rows and summary after a failed fetch, unless superseded.
    pub fn fail(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.rows.clear();
        self.summary = None;
        true
    }
}

/// An entry of the pager bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

const MAX_VISIBLE_PAGES: u32 = 7;

/// Page buttons for a pager centered on `current`: at most seven numbered
/// pages in the window, with the first and last page always reachable and
/// skipped runs collapsed into an ellipsis. Empty when there are no pages.
pub fn page_items(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }
    if total_pages <= MAX_VISIBLE_PAGES {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let half = MAX_VISIBLE_PAGES / 2;
    let mut start = current.saturating_sub(half).max(1);
    let end = (start + MAX_VISIBLE_PAGES - 1).min(total_pages);
    if end - start < MAX_VISIBLE_PAGES - 1 {
        start = (end + 1).saturating_sub(MAX_VISIBLE_PAGES).max(1);
    }

    let mut items = Vec::with_capacity(MAX_VISIBLE_PAGES as usize + 4);
    if start > 1 {
        items.push(PageItem::Page(1));
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total_pages {
        if end < total_pages - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(total_pages));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(rows: Vec<&'static str>, page: u32, page_size: u32, total: u64) -> Paged<&'static str> {
        Paged {
            data: rows,
            pagination: Pagination {
                page,
                page_size,
                total_items: total,
                total_pages: None,
            },
            summary: None,
        }
    }

    #[test]
    fn pagination_is_taken_verbatim_from_the_server() {
        let mut list: PagedList<&str> = PagedList::new(10);
        let t = list.dispatch();
        // The server clamps page_size and reports a total that does not
        // match the row count; both are displayed as-is.
        assert!(list.accept(t, response(vec!["a", "b"], 3, 100, 1234)));
        assert_eq!(
            list.page(),
            PageState {
                current: 3,
                page_size: 100,
                total: 1234
            }
        );
        assert_eq!(list.rows(), &["a", "b"]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut list: PagedList<&str> = PagedList::new(10);
        let slow = list.dispatch();
        let fast = list.dispatch();

        assert!(list.accept(fast, response(vec!["new"], 2, 10, 20)));
        assert!(!list.accept(slow, response(vec!["old"], 1, 10, 20)));
        assert!(!list.fail(slow));

        assert_eq!(list.rows(), &["new"]);
        assert_eq!(list.page().current, 2);
    }

    #[test]
    fn page_size_change_clamps_current_page() {
        let page = PageState {
            current: 9,
            page_size: 10,
            total: 85,
        };
        assert_eq!(page.page_for_size(50), 2);
        assert_eq!(page.page_for_size(5), 9);

        let empty = PageState::new(10);
        assert_eq!(empty.page_for_size(20), 1);
    }

    #[test]
    fn jump_targets_stay_in_range() {
        let page = PageState {
            current: 2,
            page_size: 10,
            total: 31,
        };
        assert_eq!(page.total_pages(), 4);
        assert!(page.can_jump_to(4));
        assert!(!page.can_jump_to(2));
        assert!(!page.can_jump_to(5));
        assert!(!page.can_jump_to(0));
    }

    #[test]
    fn pager_shows_every_page_when_few() {
        assert!(page_items(1, 0).is_empty());
        assert_eq!(
            page_items(2, 3),
            vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]
        );
    }

    #[test]
    fn pager_window_with_ellipses() {
        use PageItem::{Ellipsis, Page};

        assert_eq!(
            page_items(1, 20),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(20)]
        );
        assert_eq!(
            page_items(10, 20),
            vec![
                Page(1),
                Ellipsis,
                Page(7),
                Page(8),
                Page(9),
                Page(10),
                Page(11),
                Page(12),
                Page(13),
                Ellipsis,
                Page(20)
            ]
        );
        assert_eq!(
            page_items(20, 20),
            vec![Page(1), Ellipsis, Page(14), Page(15), Page(16), Page(17), Page(18), Page(19), Page(20)]
        );
    }
}
