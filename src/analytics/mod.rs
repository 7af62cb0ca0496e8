//! Click analytics
//!
//! Click events are bucketed by their UTC calendar date. The datastore does
//! the grouping; this module owns the time ranges handed to it and the
//! shapes handed back to callers.

pub mod models;
pub mod range;

pub use models::{ClickCount, DailyClicks};
pub use range::{parse_date, parse_date_time, DateParseError, TimeRange};
