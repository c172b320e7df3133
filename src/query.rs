use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::{AdKind, AdStatus};

/// A filter selector where one value means "no constraint".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: Copy> Selection<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(*v),
        }
    }
}

impl<T: FromStr> FromStr for Selection<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            s.parse().map(Selection::Only)
        }
    }
}

impl FromStr for AdKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(AdKind::Main),
            "secondary" => Ok(AdKind::Secondary),
            other => Err(format!("unknown ad type '{other}' (expected main or secondary)")),
        }
    }
}

impl FromStr for AdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AdStatus::Active),
            "inactive" => Ok(AdStatus::Inactive),
            other => Err(format!("unknown status '{other}' (expected active or inactive)")),
        }
    }
}

// ── Ads list filter ────────────────────────────────────────────────────────

/// Operator-facing filter state of the ad list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub kind: Selection<AdKind>,
    pub status: Selection<AdStatus>,
}

/// Query string of `GET /ads`. Unconstrained filters are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AdKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdStatus>,
}

impl AdFilter {
    pub fn to_query(&self) -> AdQuery {
        AdQuery {
            start: self.start,
            end: self.end,
            kind: self.kind.value(),
            status: self.status.value(),
        }
    }
}

// ── Stats queries ──────────────────────────────────────────────────────────

/// Inclusive day range used by the stats endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `days` days back from `today`, inclusive of both ends.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }
}

/// Query string of `GET /stats/clicks/by_domain_ip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClickStatsQuery {
    #[serde(flatten)]
    pub range: DateRange,
    #[serde(rename = "type")]
    pub kind: AdKind,
    pub page: u32,
    pub page_size: u32,
}

/// Query string of `GET /stats/visitors/by_domain_ip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitorStatsQuery {
    #[serde(flatten)]
    pub range: DateRange,
    pub page: u32,
    pub page_size: u32,
}
