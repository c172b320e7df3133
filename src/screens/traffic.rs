use chrono::NaiveDate;

use crate::{
    api::AdminApi,
    error::ApiResult,
    models::{DailyStats, Overview},
    query::DateRange,
};

/// All-time overview plus the per-day series of a selected range.
#[derive(Debug)]
pub struct TrafficScreen {
    range: DateRange,
    overview: Overview,
    daily: DailyStats,
}

impl TrafficScreen {
    /// Starts on the last seven days.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            range: DateRange::last_days(today, 7),
            overview: Overview::default(),
            daily: DailyStats::default(),
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn overview(&self) -> Overview {
        self.overview
    }

    pub fn daily(&self) -> &DailyStats {
        &self.daily
    }

    /// Totals over the selected range.
    pub fn kpis(&self) -> Overview {
        self.daily.totals()
    }

    /// Fetch the overview and the daily series together. Each part is kept
    /// from the last successful read if its own request fails.
    pub async fn load<A: AdminApi + ?Sized>(&mut self, api: &A) -> ApiResult<()> {
        let (overview, daily) = tokio::join!(api.overview(), api.daily_stats(&self.range));

        let overview_err = match overview {
            Ok(o) => {
                self.overview = o;
                None
            }
            Err(e) => {
                tracing::error!("failed to load traffic overview: {}", e);
                Some(e)
            }
        };

        match daily {
            Ok(d) => self.daily = d,
            Err(e) => {
                tracing::error!("failed to load daily traffic: {}", e);
                return Err(e);
            }
        }

        overview_err.map_or(Ok(()), Err)
    }

    pub async fn set_range<A: AdminApi + ?Sized>(&mut self, api: &A, range: DateRange) -> ApiResult<()> {
        self.range = range;
        self.load(api).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::FakeAdmin;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[tokio::test]
    async fn kpis_sum_the_daily_series() {
        let api = FakeAdmin::default();
        let mut screen = TrafficScreen::new(today());
        screen.load(&api).await.unwrap();

        assert_eq!(screen.overview().total_views, 1000);
        let kpis = screen.kpis();
        assert_eq!(kpis.total_views, 40);
        assert_eq!(kpis.total_clicks, 4);
        assert_eq!(kpis.main_clicks + kpis.secondary_clicks, 4);

        let mut calls = api.calls();
        calls.sort();
        assert_eq!(calls, ["daily_stats 2025-06-08..2025-06-15", "overview"]);
    }

    #[tokio::test]
    async fn failed_overview_keeps_the_daily_series() {
        let api = FakeAdmin::default();
        api.fail("overview");
        let mut screen = TrafficScreen::new(today());

        assert!(screen.load(&api).await.is_err());
        assert_eq!(screen.overview(), Overview::default());
        assert_eq!(screen.daily().page_views.len(), 1);
    }
}
