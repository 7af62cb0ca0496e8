//! Time ranges for analytics queries

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Malformed date or date-time in a query parameter
#[derive(Debug, Error)]
#[error("invalid {param} '{value}': {source}")]
pub struct DateParseError {
    pub param: &'static str,
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Parse an ISO-8601 local date-time such as `2024-01-31T13:45:00`
pub fn parse_date_time(param: &'static str, value: &str) -> Result<NaiveDateTime, DateParseError> {
    value
        .trim()
        .parse::<NaiveDateTime>()
        .map_err(|source| DateParseError {
            param,
            value: value.to_string(),
            source,
        })
}

/// Parse an ISO-8601 date such as `2024-01-31`
pub fn parse_date(param: &'static str, value: &str) -> Result<NaiveDate, DateParseError> {
    value
        .trim()
        .parse::<NaiveDate>()
        .map_err(|source| DateParseError {
            param,
            value: value.to_string(),
            source,
        })
}

/// Half-open `[start, end)` range of Unix timestamps (seconds, UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Range covering both endpoints, at second granularity
    pub fn inclusive(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: start.and_utc().timestamp(),
            end: end.and_utc().timestamp().saturating_add(1),
        }
    }

    /// Range from the start of `first` up to the end of `last`
    pub fn whole_days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = first.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end = last
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN).and_utc().timestamp())
            .unwrap_or(i64::MAX);
        Self { start, end }
    }

    #[cfg(test)]
    fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> i64 {
        s.parse::<NaiveDateTime>().unwrap().and_utc().timestamp()
    }

    #[test]
    fn inclusive_range_keeps_the_end_second() {
        let range = TimeRange::inclusive(
            parse_date_time("startDate", "2024-01-01T00:00:00").unwrap(),
            parse_date_time("endDate", "2024-01-02T12:00:00").unwrap(),
        );

        assert!(range.contains(ts("2024-01-01T00:00:00")));
        assert!(range.contains(ts("2024-01-02T12:00:00")));
        assert!(!range.contains(ts("2024-01-02T12:00:01")));
        assert!(!range.contains(ts("2023-12-31T23:59:59")));
    }

    #[test]
    fn whole_days_include_the_last_day_only_up_to_midnight() {
        let range = TimeRange::whole_days(
            parse_date("startDate", "2024-02-28").unwrap(),
            parse_date("endDate", "2024-02-29").unwrap(),
        );

        assert!(range.contains(ts("2024-02-28T00:00:00")));
        assert!(range.contains(ts("2024-02-29T23:59:59")));
        assert!(!range.contains(ts("2024-03-01T00:00:00")));
        assert_eq!(range.end - range.start, 2 * 86_400);
    }

    #[test]
    fn reversed_ranges_are_empty() {
        let range = TimeRange::whole_days(
            parse_date("startDate", "2024-05-10").unwrap(),
            parse_date("endDate", "2024-05-01").unwrap(),
        );
        assert!(range.is_empty());
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        let parsed = parse_date_time("startDate", "2024-01-01T08:30:15.250").unwrap();
        assert_eq!(parsed.and_utc().timestamp(), ts("2024-01-01T08:30:15"));
    }

    #[test]
    fn malformed_values_name_the_parameter() {
        let err = parse_date("endDate", "31/01/2024").unwrap_err();
        assert_eq!(err.param, "endDate");
        assert!(err.to_string().starts_with("invalid endDate '31/01/2024'"));

        assert!(parse_date_time("startDate", "2024-01-01").is_err());
    }
}
