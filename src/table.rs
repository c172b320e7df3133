use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Row comparator used by a sortable column.
pub type Comparator<R> = Box<dyn Fn(&R, &R) -> Ordering + Send + Sync>;

pub struct Column<R> {
    pub key: &'static str,
    pub title: &'static str,
    compare: Option<Comparator<R>>,
}

impl<R> Column<R> {
    /// A column without sort affordances.
    pub fn plain(key: &'static str, title: &'static str) -> Self {
        Self {
            key,
            title,
            compare: None,
        }
    }

    pub fn sortable(
        key: &'static str,
        title: &'static str,
        compare: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            title,
            compare: Some(Box::new(compare)),
        }
    }

    /// Sort by the numeric value of a field; unparseable values sort first.
    pub fn numeric<F>(key: &'static str, title: &'static str, field: F) -> Self
    where
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        Self::sortable(key, title, move |a, b| {
            compare_keys(parse_number(&field(a)), parse_number(&field(b)))
        })
    }

    /// Sort by the epoch value of a date or timestamp field.
    pub fn date<F>(key: &'static str, title: &'static str, field: F) -> Self
    where
        F: Fn(&R) -> Option<String> + Send + Sync + 'static,
    {
        Self::sortable(key, title, move |a, b| {
            compare_keys(
                field(a).as_deref().and_then(parse_epoch_millis),
                field(b).as_deref().and_then(parse_epoch_millis),
            )
        })
    }

    pub fn is_sortable(&self) -> bool {
        self.compare.is_some()
    }
}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("sortable", &self.is_sortable())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: &'static str,
    pub direction: Direction,
}

/// Column definitions plus this instance's sort state. Sorting only reorders
/// the rows handed in (the current page); it never triggers a fetch.
#[derive(Debug)]
pub struct Table<R> {
    columns: Vec<Column<R>>,
    sort: Option<SortState>,
}

impl<R> Table<R> {
    pub fn new(columns: Vec<Column<R>>) -> Self {
        Self {
            columns,
            sort: None,
        }
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Header click: ascending, then descending, then unsorted. Clicks on
    /// unknown or non-sortable columns are ignored.
    pub fn toggle_sort(&mut self, key: &str) -> Option<SortState> {
        let Some(column) = self.columns.iter().find(|c| c.key == key && c.is_sortable()) else {
            return self.sort;
        };

        self.sort = match self.sort {
            Some(s) if s.column == column.key => match s.direction {
                Direction::Ascending => Some(SortState {
                    column: column.key,
                    direction: Direction::Descending,
                }),
                Direction::Descending => None,
            },
            _ => Some(SortState {
                column: column.key,
                direction: Direction::Ascending,
            }),
        };
        self.sort
    }

    /// Set the sort explicitly. Ignored for non-sortable columns.
    pub fn sort_by(&mut self, key: &str, direction: Direction) -> Option<SortState> {
        if let Some(column) = self.columns.iter().find(|c| c.key == key && c.is_sortable()) {
            self.sort = Some(SortState {
                column: column.key,
                direction,
            });
        }
        self.sort
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// `rows` in display order. Stable, so equal keys keep server order.
    pub fn view<'a>(&self, rows: &'a [R]) -> Vec<&'a R> {
        let mut view: Vec<&R> = rows.iter().collect();
        let Some(sort) = self.sort else {
            return view;
        };
        let Some(compare) = self
            .columns
            .iter()
            .find(|c| c.key == sort.column)
            .and_then(|c| c.compare.as_ref())
        else {
            return view;
        };

        view.sort_by(|a, b| {
            let ord = compare(*a, *b);
            match sort.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        view
    }
}

fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Milliseconds since the epoch for the date formats the backend emits:
/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, or `YYYY-MM-DD`.
pub fn parse_epoch_millis(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
}
