//! URL mapping service
//!
//! Orchestrates the storage backend: shortening with collision retry,
//! click recording on resolution, and per-date analytics.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::analytics::models::totals_by_date;
use crate::analytics::{ClickCount, TimeRange};
use crate::models::UrlMapping;
use crate::shortcode::generate_short_code;
use crate::storage::{Storage, StorageError};

/// Attempts at finding an unused short code before giving up
pub const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("no unused short code found after {0} attempts")]
    CodeSpaceExhausted(usize),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct UrlService {
    storage: Arc<dyn Storage>,
}

impl UrlService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Shorten `original_url` on behalf of `owner`
    pub async fn create_short_url(&self, original_url: &str, owner: &str) -> ServiceResult<UrlMapping> {
        self.create_short_url_with(original_url, owner, generate_short_code)
            .await
    }

    /// Shorten with a caller-supplied code generator.
    ///
    /// A taken code is retried with a fresh one, at most
    /// [`MAX_CODE_ATTEMPTS`] times.
    pub async fn create_short_url_with<G>(
        &self,
        original_url: &str,
        owner: &str,
        mut generate: G,
    ) -> ServiceResult<UrlMapping>
    where
        G: FnMut() -> String + Send,
    {
        let original_url = validate_url(original_url)?;
        let created_at = Utc::now().timestamp();

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate();
            match self
                .storage
                .create_mapping(&code, &original_url, owner, created_at)
                .await
            {
                Ok(mapping) => {
                    info!(short_url = %mapping.short_url, owner, "created short url");
                    return Ok(mapping);
                }
                Err(StorageError::Conflict) => {
                    warn!(short_url = %code, attempt, "short code collision, retrying");
                }
                Err(StorageError::Other(e)) => return Err(ServiceError::Storage(e)),
            }
        }

        Err(ServiceError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Mappings owned by `owner`, newest first
    pub async fn urls_for_owner(&self, owner: &str) -> ServiceResult<Vec<UrlMapping>> {
        Ok(self.storage.list_by_owner(owner).await?)
    }

    /// Resolve a short code, recording the click at the current time
    pub async fn resolve(&self, short_url: &str) -> ServiceResult<Option<UrlMapping>> {
        self.resolve_at(short_url, Utc::now().naive_utc()).await
    }

    /// Resolve a short code, recording the click at `clicked_at` (UTC)
    pub async fn resolve_at(
        &self,
        short_url: &str,
        clicked_at: NaiveDateTime,
    ) -> ServiceResult<Option<UrlMapping>> {
        let mapping = self
            .storage
            .record_click(short_url, clicked_at.and_utc().timestamp())
            .await?;

        match &mapping {
            Some(m) => debug!(short_url, clicks = m.click_count, "recorded click"),
            None => debug!(short_url, "short url not found"),
        }

        Ok(mapping)
    }

    /// Per-date clicks on one short code between `start` and `end`, both inclusive.
    ///
    /// `None` means the code does not exist; a known code without clicks in
    /// the range yields an empty series.
    pub async fn click_counts_by_date(
        &self,
        short_url: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> ServiceResult<Option<Vec<ClickCount>>> {
        let Some(mapping) = self.storage.get(short_url).await? else {
            return Ok(None);
        };

        let range = TimeRange::inclusive(start, end);
        if range.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let daily = self.storage.daily_clicks(mapping.id, range).await?;
        Ok(Some(daily.into_iter().map(ClickCount::from).collect()))
    }

    /// Per-date clicks across every mapping of `owner`, from the start of
    /// `start_date` through the end of `end_date`. Dates without clicks are absent.
    pub async fn total_clicks(
        &self,
        owner: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ServiceResult<BTreeMap<NaiveDate, i64>> {
        let range = TimeRange::whole_days(start_date, end_date);
        if range.is_empty() {
            return Ok(BTreeMap::new());
        }

        let daily = self.storage.daily_clicks_for_owner(owner, range).await?;
        Ok(totals_by_date(daily))
    }
}

/// Parse and normalize a destination URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted. The returned
/// string is the serialized form, percent-encoded and safe for a `Location`
/// header.
fn validate_url(original_url: &str) -> ServiceResult<String> {
    let trimmed = original_url.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| ServiceError::InvalidUrl(format!("Invalid URL format: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ServiceError::InvalidUrl(
            "URL must start with http:// or https://".to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ServiceError::InvalidUrl("URL must have a host".to_string()));
    }

    Ok(url.into())
}
