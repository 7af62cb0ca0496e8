use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A short code and the URL it points at, owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UrlMapping {
    pub id: i64,
    pub original_url: String,
    pub short_url: String,
    pub owner: String,
    pub created_at: i64,
    pub click_count: i64,
}

/// One resolution of a short code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: i64,
    pub mapping_id: i64,
    pub clicked_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub original_url: String,
}

/// Mapping as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMappingDto {
    pub id: i64,
    pub original_url: String,
    pub short_url: String,
    pub created_date: NaiveDateTime,
    pub username: String,
    pub click_count: i64,
}

impl From<UrlMapping> for UrlMappingDto {
    fn from(mapping: UrlMapping) -> Self {
        let created_date = DateTime::from_timestamp(mapping.created_at, 0)
            .unwrap_or_default()
            .naive_utc();

        Self {
            id: mapping.id,
            original_url: mapping.original_url,
            short_url: mapping.short_url,
            created_date,
            username: mapping.owner,
            click_count: mapping.click_count,
        }
    }
}
