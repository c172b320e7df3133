//! Click and visitor statistics by domain and IP, paginated on the server.
//!
//! Every fetch is split into `prepare` (which records a ticket) and
//! `complete` (which lands the response only if no newer fetch has been
//! prepared since). `fetch_page` runs both back to back; callers that issue
//! overlapping fetches drive the halves themselves.

use chrono::NaiveDate;

use crate::{
    api::AdminApi,
    error::ApiResult,
    listing::{page_items, PageItem, PageState, PagedList, Ticket},
    models::{AdKind, ClickStatRow, Paged, VisitorStatRow, VisitorSummary},
    query::{ClickStatsQuery, DateRange, VisitorStatsQuery},
    table::{Column, Table},
};

/// Days covered by the default date range.
pub const DEFAULT_RANGE_DAYS: u64 = 30;

fn land<T, S>(
    list: &mut PagedList<T, S>,
    ticket: Ticket,
    result: ApiResult<Paged<T, S>>,
    what: &str,
) -> ApiResult<bool> {
    match result {
        Ok(page) => Ok(list.accept(ticket, page)),
        Err(e) => {
            if list.fail(ticket) {
                tracing::error!("failed to load {}: {}", what, e);
            } else {
                tracing::debug!("ignoring failure of superseded {} fetch: {}", what, e);
            }
            Err(e)
        }
    }
}

fn pager(page: PageState) -> Vec<PageItem> {
    let total = u32::try_from(page.total_pages()).unwrap_or(u32::MAX);
    page_items(page.current, total)
}

// ── Clicks ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ClickStatsScreen {
    list: PagedList<ClickStatRow>,
    range: DateRange,
    kind: AdKind,
    table: Table<ClickStatRow>,
}

impl ClickStatsScreen {
    /// Main-ad clicks over the last thirty days.
    pub fn new(today: NaiveDate, page_size: u32) -> Self {
        Self {
            list: PagedList::new(page_size),
            range: DateRange::last_days(today, DEFAULT_RANGE_DAYS),
            kind: AdKind::Main,
            table: Table::new(vec![
                Column::plain("domain", "Domain"),
                Column::plain("ip", "IP"),
                Column::numeric("clicks", "Clicks", |r: &ClickStatRow| r.clicks.to_string()),
                Column::date("day", "Day", |r: &ClickStatRow| Some(r.day.clone())),
            ]),
        }
    }

    /// Replace the filters without fetching.
    pub fn with_filter(mut self, range: DateRange, kind: AdKind) -> Self {
        self.range = range;
        self.kind = kind;
        self
    }

    pub fn rows(&self) -> &[ClickStatRow] {
        self.list.rows()
    }

    pub fn view(&self) -> Vec<&ClickStatRow> {
        self.table.view(self.list.rows())
    }

    pub fn page(&self) -> PageState {
        self.list.page()
    }

    pub fn pager(&self) -> Vec<PageItem> {
        pager(self.list.page())
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn kind(&self) -> AdKind {
        self.kind
    }

    pub fn table_mut(&mut self) -> &mut Table<ClickStatRow> {
        &mut self.table
    }

    pub fn query(&self, page: u32, page_size: u32) -> ClickStatsQuery {
        ClickStatsQuery {
            range: self.range,
            kind: self.kind,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn prepare(&mut self, page: u32, page_size: u32) -> (Ticket, ClickStatsQuery) {
        (self.list.dispatch(), self.query(page, page_size))
    }

    /// Land a response. `Ok(false)` means it was superseded and dropped.
    pub fn complete(&mut self, ticket: Ticket, result: ApiResult<Paged<ClickStatRow>>) -> ApiResult<bool> {
        land(&mut self.list, ticket, result, "click stats")
    }

    pub async fn fetch_page<A: AdminApi + ?Sized>(
        &mut self,
        api: &A,
        page: u32,
        page_size: u32,
    ) -> ApiResult<bool> {
        let (ticket, query) = self.prepare(page, page_size);
        let result = api.clicks_by_domain_ip(&query).await;
        self.complete(ticket, result)
    }

    pub async fn refresh<A: AdminApi + ?Sized>(&mut self, api: &A) -> ApiResult<bool> {
        let page = self.list.page();
        self.fetch_page(api, page.current, page.page_size).await
    }

    /// New filters always restart from page one.
    pub async fn set_filter<A: AdminApi + ?Sized>(
        &mut self,
        api: &A,
        range: DateRange,
        kind: AdKind,
    ) -> ApiResult<bool> {
        self.range = range;
        self.kind = kind;
        let size = self.list.page().page_size;
        self.fetch_page(api, 1, size).await
    }

    pub async fn change_page_size<A: AdminApi + ?Sized>(&mut self, api: &A, page_size: u32) -> ApiResult<bool> {
        let page = self.list.page().page_for_size(page_size);
        self.fetch_page(api, page, page_size).await
    }
}

// ── Visitors ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct VisitorStatsScreen {
    list: PagedList<VisitorStatRow, VisitorSummary>,
    range: DateRange,
    table: Table<VisitorStatRow>,
}

impl VisitorStatsScreen {
    pub fn new(today: NaiveDate, page_size: u32) -> Self {
        Self {
            list: PagedList::new(page_size),
            range: DateRange::last_days(today, DEFAULT_RANGE_DAYS),
            table: Table::new(vec![
                Column::plain("domain", "Domain"),
                Column::plain("ip", "IP"),
                Column::numeric("visits", "Visits", |r: &VisitorStatRow| r.visits.to_string()),
                Column::date("day", "Day", |r: &VisitorStatRow| Some(r.day.clone())),
            ]),
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn rows(&self) -> &[VisitorStatRow] {
        self.list.rows()
    }

    pub fn view(&self) -> Vec<&VisitorStatRow> {
        self.table.view(self.list.rows())
    }

    /// Totals of the last landed response, zeros when there is none.
    pub fn summary(&self) -> VisitorSummary {
        self.list.summary().copied().unwrap_or_default()
    }

    pub fn page(&self) -> PageState {
        self.list.page()
    }

    pub fn pager(&self) -> Vec<PageItem> {
        pager(self.list.page())
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn table_mut(&mut self) -> &mut Table<VisitorStatRow> {
        &mut self.table
    }

    pub fn query(&self, page: u32, page_size: u32) -> VisitorStatsQuery {
        VisitorStatsQuery {
            range: self.range,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn prepare(&mut self, page: u32, page_size: u32) -> (Ticket, VisitorStatsQuery) {
        (self.list.dispatch(), self.query(page, page_size))
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Paged<VisitorStatRow, VisitorSummary>>,
    ) -> ApiResult<bool> {
        land(&mut self.list, ticket, result, "visitor stats")
    }

    pub async fn fetch_page<A: AdminApi + ?Sized>(
        &mut self,
        api: &A,
        page: u32,
        page_size: u32,
    ) -> ApiResult<bool> {
        let (ticket, query) = self.prepare(page, page_size);
        let result = api.visitors_by_domain_ip(&query).await;
        self.complete(ticket, result)
    }

    pub async fn refresh<A: AdminApi + ?Sized>(&mut self, api: &A) -> ApiResult<bool> {
        let page = self.list.page();
        self.fetch_page(api, page.current, page.page_size).await
    }

    pub async fn set_range<A: AdminApi + ?Sized>(&mut self, api: &A, range: DateRange) -> ApiResult<bool> {
        self.range = range;
        let size = self.list.page().page_size;
        self.fetch_page(api, 1, size).await
    }

    pub async fn change_page_size<A: AdminApi + ?Sized>(&mut self, api: &A, page_size: u32) -> ApiResult<bool> {
        let page = self.list.page().page_for_size(page_size);
        self.fetch_page(api, page, page_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Pagination,
        screens::testing::FakeAdmin,
        table::Direction,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    fn click_page(page: u32, day: &str) -> Paged<ClickStatRow> {
        Paged {
            data: vec![ClickStatRow {
                domain: "blog.example".into(),
                ip: "198.51.100.4".into(),
                clicks: 1,
                day: day.into(),
            }],
            pagination: Pagination {
                page,
                page_size: 10,
                total_items: 25,
                total_pages: Some(3),
            },
            summary: None,
        }
    }

    #[tokio::test]
    async fn first_fetch_uses_default_filters() {
        let api = FakeAdmin::default();
        *api.stats_total.lock().unwrap() = 42;
        let mut screen = ClickStatsScreen::new(today(), 10);

        assert!(screen.refresh(&api).await.unwrap());
        assert_eq!(api.calls(), ["clicks_by_domain_ip main page=1 size=10"]);
        assert_eq!(screen.range().start, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(
            screen.page(),
            PageState {
                current: 1,
                page_size: 10,
                total: 42
            }
        );
    }

    #[test]
    fn superseded_response_is_dropped() {
        let mut screen = ClickStatsScreen::new(today(), 10);
        let (slow, _) = screen.prepare(1, 10);
        let (fast, query) = screen.prepare(2, 10);
        assert_eq!(query.page, 2);

        assert!(screen.complete(fast, Ok(click_page(2, "2025-03-02"))).unwrap());
        assert!(!screen.complete(slow, Ok(click_page(1, "2025-03-01"))).unwrap());
        assert_eq!(screen.page().current, 2);
        assert_eq!(screen.rows()[0].day, "2025-03-02");
    }

    #[test]
    fn superseded_failure_leaves_rows_alone() {
        let mut screen = ClickStatsScreen::new(today(), 10);
        let (slow, _) = screen.prepare(1, 10);
        let (fast, _) = screen.prepare(2, 10);
        screen.complete(fast, Ok(click_page(2, "2025-03-02"))).unwrap();

        let err = crate::error::ApiError::Invalid("boom".into());
        assert!(screen.complete(slow, Err(err)).is_err());
        assert_eq!(screen.rows().len(), 1);
    }

    #[tokio::test]
    async fn page_size_change_clamps_current_page() {
        let api = FakeAdmin::default();
        *api.stats_total.lock().unwrap() = 95;
        let mut screen = ClickStatsScreen::new(today(), 10);
        screen.fetch_page(&api, 9, 10).await.unwrap();

        screen.change_page_size(&api, 50).await.unwrap();
        assert_eq!(screen.page().current, 2);
        assert_eq!(screen.page().page_size, 50);
        assert_eq!(api.calls()[1], "clicks_by_domain_ip main page=2 size=50");
    }

    #[tokio::test]
    async fn filter_change_restarts_at_page_one() {
        let api = FakeAdmin::default();
        *api.stats_total.lock().unwrap() = 95;
        let mut screen = ClickStatsScreen::new(today(), 10);
        screen.fetch_page(&api, 4, 10).await.unwrap();

        screen
            .set_filter(&api, DateRange::single_day(today()), AdKind::Secondary)
            .await
            .unwrap();
        assert_eq!(screen.page().current, 1);
        assert_eq!(api.calls()[1], "clicks_by_domain_ip secondary page=1 size=10");
    }

    #[tokio::test]
    async fn visitor_failure_clears_rows_and_summary() {
        let api = FakeAdmin::default();
        *api.stats_total.lock().unwrap() = 12;
        let mut screen = VisitorStatsScreen::new(today(), 10);
        screen.refresh(&api).await.unwrap();
        assert_eq!(screen.summary().total_visits, 99);
        assert_eq!(screen.rows().len(), 1);

        api.fail("visitors_by_domain_ip");
        assert!(screen.fetch_page(&api, 2, 10).await.is_err());
        assert!(screen.rows().is_empty());
        assert_eq!(screen.summary(), VisitorSummary::default());
    }

    #[test]
    fn day_column_sorts_by_date() {
        let mut screen = ClickStatsScreen::new(today(), 10);
        let (t, _) = screen.prepare(1, 10);
        let mut page = click_page(1, "2025-03-10");
        page.data.push(ClickStatRow {
            domain: "news.example".into(),
            ip: "198.51.100.5".into(),
            clicks: 9,
            day: "2025-02-28".into(),
        });
        screen.complete(t, Ok(page)).unwrap();

        screen.table_mut().sort_by("day", Direction::Ascending);
        let days: Vec<&str> = screen.view().into_iter().map(|r| r.day.as_str()).collect();
        assert_eq!(days, ["2025-02-28", "2025-03-10"]);
    }

    #[tokio::test]
    async fn pager_follows_server_totals() {
        let api = FakeAdmin::default();
        *api.stats_total.lock().unwrap() = 200;
        let mut screen = VisitorStatsScreen::new(today(), 10);
        screen.fetch_page(&api, 10, 10).await.unwrap();

        let items = screen.pager();
        assert_eq!(items.first(), Some(&PageItem::Page(1)));
        assert_eq!(items.last(), Some(&PageItem::Page(20)));
        assert!(items.contains(&PageItem::Page(10)));
        assert!(items.contains(&PageItem::Ellipsis));
    }
}
