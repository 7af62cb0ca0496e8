use crate::analytics::{DailyClicks, TimeRange};
use crate::models::{ClickEvent, UrlMapping};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Create a mapping for `short_url`; fails with `Conflict` if the code is taken
    async fn create_mapping(
        &self,
        short_url: &str,
        original_url: &str,
        owner: &str,
        created_at: i64,
    ) -> StorageResult<UrlMapping>;

    /// Get a mapping by short code
    async fn get(&self, short_url: &str) -> Result<Option<UrlMapping>>;

    /// List the mappings owned by `owner`, newest first
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<UrlMapping>>;

    /// Record one click at `clicked_at`.
    ///
    /// Increments the click counter and appends a click event in a single
    /// transaction. Returns the updated mapping, or `None` if the code is
    /// unknown (nothing is written in that case).
    async fn record_click(&self, short_url: &str, clicked_at: i64)
        -> Result<Option<UrlMapping>>;

    /// All click events of a mapping, oldest first
    async fn click_events(&self, mapping_id: i64) -> Result<Vec<ClickEvent>>;

    /// Number of click events stored for a mapping
    async fn count_click_events(&self, mapping_id: i64) -> Result<i64>;

    /// Clicks on one mapping inside `range`, grouped by UTC date
    async fn daily_clicks(&self, mapping_id: i64, range: TimeRange) -> Result<Vec<DailyClicks>>;

    /// Clicks on every mapping owned by `owner` inside `range`, grouped by UTC date
    async fn daily_clicks_for_owner(&self, owner: &str, range: TimeRange)
        -> Result<Vec<DailyClicks>>;
}

/// Convert `(YYYY-MM-DD, count)` rows produced by the date `GROUP BY` queries
pub(crate) fn parse_daily_rows(rows: Vec<(String, i64)>) -> Result<Vec<DailyClicks>> {
    rows.into_iter()
        .map(|(date, count)| {
            let date = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("datastore returned malformed date '{date}': {e}"))?;
            Ok(DailyClicks { date, count })
        })
        .collect()
}
