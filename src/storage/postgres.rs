use crate::analytics::{DailyClicks, TimeRange};
use crate::models::{ClickEvent, UrlMapping};
use crate::storage::trait_def::parse_daily_rows;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS url_mappings (
                id BIGSERIAL PRIMARY KEY,
                original_url TEXT NOT NULL,
                short_url TEXT NOT NULL UNIQUE,
                owner TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                click_count BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_url_mappings_owner ON url_mappings(owner)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS click_events (
                id BIGSERIAL PRIMARY KEY,
                mapping_id BIGINT NOT NULL REFERENCES url_mappings(id),
                clicked_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_click_events_mapping_time ON click_events(mapping_id, clicked_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_mapping(
        &self,
        short_url: &str,
        original_url: &str,
        owner: &str,
        created_at: i64,
    ) -> StorageResult<UrlMapping> {
        let row = sqlx::query_as::<_, UrlMapping>(
            r#"
            INSERT INTO url_mappings (original_url, short_url, owner, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (short_url) DO NOTHING
            RETURNING id, original_url, short_url, owner, created_at, click_count
            "#,
        )
        .bind(original_url)
        .bind(short_url)
        .bind(owner)
        .bind(created_at)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        row.ok_or(StorageError::Conflict)
    }

    async fn get(&self, short_url: &str) -> Result<Option<UrlMapping>> {
        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, original_url, short_url, owner, created_at, click_count
            FROM url_mappings
            WHERE short_url = $1
            "#,
        )
        .bind(short_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<UrlMapping>> {
        let mappings = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, original_url, short_url, owner, created_at, click_count
            FROM url_mappings
            WHERE owner = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(mappings)
    }

    async fn record_click(
        &self,
        short_url: &str,
        clicked_at: i64,
    ) -> Result<Option<UrlMapping>> {
        let mut tx = self.pool.begin().await?;

        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            UPDATE url_mappings
            SET click_count = click_count + 1
            WHERE short_url = $1
            RETURNING id, original_url, short_url, owner, created_at, click_count
            "#,
        )
        .bind(short_url)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mapping) = mapping else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("INSERT INTO click_events (mapping_id, clicked_at) VALUES ($1, $2)")
            .bind(mapping.id)
            .bind(clicked_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(mapping))
    }

    async fn click_events(&self, mapping_id: i64) -> Result<Vec<ClickEvent>> {
        let events = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, mapping_id, clicked_at
            FROM click_events
            WHERE mapping_id = $1
            ORDER BY clicked_at, id
            "#,
        )
        .bind(mapping_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(events)
    }

    async fn count_click_events(&self, mapping_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_events WHERE mapping_id = $1")
            .bind(mapping_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn daily_clicks(&self, mapping_id: i64, range: TimeRange) -> Result<Vec<DailyClicks>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT to_char(to_timestamp(clicked_at) AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS click_date,
                   COUNT(*) AS clicks
            FROM click_events
            WHERE mapping_id = $1 AND clicked_at >= $2 AND clicked_at < $3
            GROUP BY click_date
            ORDER BY click_date
            "#,
        )
        .bind(mapping_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool.as_ref())
        .await?;

        parse_daily_rows(rows)
    }

    async fn daily_clicks_for_owner(
        &self,
        owner: &str,
        range: TimeRange,
    ) -> Result<Vec<DailyClicks>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT to_char(to_timestamp(c.clicked_at) AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS click_date,
                   COUNT(*) AS clicks
            FROM click_events c
            JOIN url_mappings m ON m.id = c.mapping_id
            WHERE m.owner = $1 AND c.clicked_at >= $2 AND c.clicked_at < $3
            GROUP BY click_date
            ORDER BY click_date
            "#,
        )
        .bind(owner)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool.as_ref())
        .await?;

        parse_daily_rows(rows)
    }
}
