use crate::analytics::{DailyClicks, TimeRange};
use crate::models::{ClickEvent, UrlMapping};
use crate::storage::trait_def::parse_daily_rows;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS url_mappings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_url TEXT NOT NULL,
                short_url TEXT NOT NULL UNIQUE,
                owner TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                click_count INTEGER NOT NULL DEFAULT 0
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
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mapping_id INTEGER NOT NULL REFERENCES url_mappings(id),
                clicked_at INTEGER NOT NULL
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
        let result = sqlx::query(
            r#"
            INSERT INTO url_mappings (original_url, short_url, owner, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(short_url) DO NOTHING
            "#,
        )
        .bind(original_url)
        .bind(short_url)
        .bind(owner)
        .bind(created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, original_url, short_url, owner, created_at, click_count
            FROM url_mappings
            WHERE id = ?
            "#,
        )
        .bind(result.last_insert_rowid())
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(mapping)
    }

    async fn get(&self, short_url: &str) -> Result<Option<UrlMapping>> {
        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, original_url, short_url, owner, created_at, click_count
            FROM url_mappings
            WHERE short_url = ?
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
            WHERE owner = ?
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

        // Write first so the transaction takes the write lock up front
        let updated = sqlx::query(
            r#"
            UPDATE url_mappings
            SET click_count = click_count + 1
            WHERE short_url = ?
            "#,
        )
        .bind(short_url)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let mapping = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, original_url, short_url, owner, created_at, click_count
            FROM url_mappings
            WHERE short_url = ?
            "#,
        )
        .bind(short_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO click_events (mapping_id, clicked_at) VALUES (?, ?)")
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
            WHERE mapping_id = ?
            ORDER BY clicked_at, id
            "#,
        )
        .bind(mapping_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(events)
    }

    async fn count_click_events(&self, mapping_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_events WHERE mapping_id = ?")
            .bind(mapping_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn daily_clicks(&self, mapping_id: i64, range: TimeRange) -> Result<Vec<DailyClicks>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT date(clicked_at, 'unixepoch') AS click_date, COUNT(*) AS clicks
            FROM click_events
            WHERE mapping_id = ? AND clicked_at >= ? AND clicked_at < ?
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
            SELECT date(c.clicked_at, 'unixepoch') AS click_date, COUNT(*) AS clicks
            FROM click_events c
            JOIN url_mappings m ON m.id = c.mapping_id
            WHERE m.owner = ? AND c.clicked_at >= ? AND c.clicked_at < ?
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
