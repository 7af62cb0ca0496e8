//! Data models for analytics

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Clicks on one calendar date, as returned by the datastore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub count: i64,
}

/// Per-date entry of a short code's time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickCount {
    /// Start of the day the clicks fall on
    pub click_date: NaiveDateTime,
    pub count: i64,
}

impl From<DailyClicks> for ClickCount {
    fn from(daily: DailyClicks) -> Self {
        Self {
            click_date: daily.date.and_time(chrono::NaiveTime::MIN),
            count: daily.count,
        }
    }
}

/// Fold daily rows into a date-keyed map, summing duplicate dates
pub fn totals_by_date(rows: impl IntoIterator<Item = DailyClicks>) -> BTreeMap<NaiveDate, i64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals.entry(row.date).or_insert(0) += row.count;
    }
    totals
}
