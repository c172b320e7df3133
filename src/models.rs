use serde::{Deserialize, Serialize};

// ── Ads ────────────────────────────────────────────────────────────────────

/// Placement of an ad on the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdKind {
    Main,
    Secondary,
}

impl AdKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AdKind::Main => "main",
            AdKind::Secondary => "secondary",
        }
    }

    pub fn is_main(self) -> bool {
        matches!(self, AdKind::Main)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Active,
    Inactive,
}

impl AdStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdStatus::Active => "active",
            AdStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AdStatus::Active => AdStatus::Inactive,
            AdStatus::Inactive => AdStatus::Active,
        }
    }
}

/// An ad row as returned by `GET /ads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub link: String,
    pub is_main: bool,
    /// Server-relative path, e.g. "/static/uploads/abc.png"
    pub img_url: String,
    pub status: AdStatus,
    #[serde(default)]
    pub x_redirect_enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Ad {
    pub fn kind(&self) -> AdKind {
        if self.is_main {
            AdKind::Main
        } else {
            AdKind::Secondary
        }
    }
}

/// An image attached to a create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fields sent as multipart to `POST /ads/upload` and `PUT /ads/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdForm {
    pub link: String,
    pub kind: AdKind,
    pub x_redirect_enabled: bool,
    pub image: Option<ImageFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub id: i64,
}

// ── Settings ───────────────────────────────────────────────────────────────

/// The singleton delivery switches. `global_enabled` gates the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSettings {
    pub global_enabled: bool,
    pub main_enabled: bool,
    pub secondary_enabled: bool,
    #[serde(default)]
    pub main_ad_once_per_day: bool,
    #[serde(default)]
    pub secondary_ad_once_per_day: bool,
}

impl Default for AdSettings {
    fn default() -> Self {
        Self {
            global_enabled: true,
            main_enabled: true,
            secondary_enabled: true,
            main_ad_once_per_day: false,
            secondary_ad_once_per_day: false,
        }
    }
}

/// Partial update for `PATCH /ads/settings`. Absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_ad_once_per_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_ad_once_per_day: Option<bool>,
}

impl AdSettingsPatch {
    /// Apply the present fields on top of `settings`.
    pub fn apply_to(&self, settings: &AdSettings) -> AdSettings {
        AdSettings {
            global_enabled: self.global_enabled.unwrap_or(settings.global_enabled),
            main_enabled: self.main_enabled.unwrap_or(settings.main_enabled),
            secondary_enabled: self.secondary_enabled.unwrap_or(settings.secondary_enabled),
            main_ad_once_per_day: self
                .main_ad_once_per_day
                .unwrap_or(settings.main_ad_once_per_day),
            secondary_ad_once_per_day: self
                .secondary_ad_once_per_day
                .unwrap_or(settings.secondary_ad_once_per_day),
        }
    }
}

// ── Delivery ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdPair {
    pub main: Option<Ad>,
    pub secondary: Option<Ad>,
}

impl AdPair {
    pub fn get(&self, kind: AdKind) -> Option<&Ad> {
        match kind {
            AdKind::Main => self.main.as_ref(),
            AdKind::Secondary => self.secondary.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FrequencySettings {
    #[serde(default)]
    pub main_ad_once_per_day: bool,
    #[serde(default)]
    pub secondary_ad_once_per_day: bool,
}

/// Envelope of `GET /ads/random_pair`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RandomPairResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<AdPair>,
    #[serde(default)]
    pub settings: Option<FrequencySettings>,
}

impl RandomPairResponse {
    /// The pair, if the backend reported success and sent one.
    pub fn into_pair(self) -> Option<AdPair> {
        if self.code == 200 {
            self.data
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickEvent<'a> {
    pub ad_id: i64,
    pub domain: &'a str,
}

// ── Blacklist ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistDomain {
    pub id: i64,
    pub domain: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlacklistCheck {
    pub domain: String,
    pub blacklisted: bool,
}

// ── Stats ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickStatRow {
    pub domain: String,
    pub ip: String,
    pub clicks: i64,
    pub day: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorStatRow {
    pub domain: String,
    pub ip: String,
    pub visits: i64,
    pub day: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct VisitorSummary {
    #[serde(default)]
    pub total_visits: i64,
    #[serde(default)]
    pub distinct_domains: i64,
    #[serde(default)]
    pub distinct_ips: i64,
}

/// Server pagination metadata, taken verbatim from each response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

/// The `{data, pagination, summary?}` envelope of the paginated endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paged<T, S = ()> {
    pub data: Vec<T>,
    pub pagination: Pagination,
    #[serde(default)]
    pub summary: Option<S>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub total_views: i64,
    #[serde(default)]
    pub total_clicks: i64,
    #[serde(default)]
    pub main_clicks: i64,
    #[serde(default)]
    pub secondary_clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyViews {
    pub day: String,
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyClicks {
    pub day: String,
    #[serde(default)]
    pub clicks: i64,
}

/// Per-day series of `GET /stats/daily`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DailyStats {
    #[serde(default)]
    pub page_views: Vec<DailyViews>,
    #[serde(default)]
    pub clicks: Vec<DailyClicks>,
    #[serde(default)]
    pub main_clicks: Vec<DailyClicks>,
    #[serde(default)]
    pub secondary_clicks: Vec<DailyClicks>,
}

impl DailyStats {
    /// Sum each series into the same shape as the overview.
    pub fn totals(&self) -> Overview {
        fn sum(series: &[DailyClicks]) -> i64 {
            series.iter().map(|p| p.clicks).sum()
        }

        Overview {
            total_views: self.page_views.iter().map(|p| p.count).sum(),
            total_clicks: sum(&self.clicks),
            main_clicks: sum(&self.main_clicks),
            secondary_clicks: sum(&self.secondary_clicks),
        }
    }
}

/// `{data: [...]}` wrapper used by the unpaginated list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_pair_with_missing_secondary_parses() {
        let body = r#"{
            "code": 200,
            "msg": "success",
            "data": {
                "main": {"id": 1, "link": "https://a.example", "is_main": true,
                         "img_url": "/static/uploads/a.png", "status": "active",
                         "x_redirect_enabled": true, "created_at": "2025-01-02 10:00:00"},
                "secondary": null
            },
            "settings": {"main_ad_once_per_day": false, "secondary_ad_once_per_day": true}
        }"#;
        let resp: RandomPairResponse = serde_json::from_str(body).unwrap();
        let pair = resp.into_pair().unwrap();
        assert_eq!(pair.main.as_ref().map(|a| a.id), Some(1));
        assert!(pair.secondary.is_none());
    }

    #[test]
    fn non_success_code_yields_no_pair() {
        let resp = RandomPairResponse {
            code: 500,
            msg: None,
            data: Some(AdPair::default()),
            settings: None,
        };
        assert!(resp.into_pair().is_none());
    }

    #[test]
    fn settings_patch_only_serializes_present_fields() {
        let patch = AdSettingsPatch {
            main_enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"main_enabled":false}"#
        );
        let next = patch.apply_to(&AdSettings::default());
        assert!(!next.main_enabled);
        assert!(next.global_enabled && next.secondary_enabled);
    }

    #[test]
    fn daily_totals_sum_each_series() {
        let daily: DailyStats = serde_json::from_str(
            r#"{"page_views":[{"day":"2025-01-01","count":3},{"day":"2025-01-02","count":4}],
                "clicks":[{"day":"2025-01-01","clicks":2}],
                "main_clicks":[{"day":"2025-01-01","clicks":1}],
                "secondary_clicks":[{"day":"2025-01-01","clicks":1}]}"#,
        )
        .unwrap();
        let totals = daily.totals();
        assert_eq!(totals.total_views, 7);
        assert_eq!(totals.total_clicks, 2);
        assert_eq!(totals.main_clicks, 1);
        assert_eq!(totals.secondary_clicks, 1);
    }
}
