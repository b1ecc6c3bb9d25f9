//! SQLite-backed content storage.
//!
//! The store owns the upsert discipline: records are identified by their
//! (title, kind) natural key, `scraped_at`/`created_at` are written once at
//! first insert and never touched again, `updated_at` refreshes on every
//! successful save. Deletion is an administrative operation and has no API
//! here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use thiserror::Error;

use reelfeed_core::{ContentKind, ContentRecord};

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    kind TEXT NOT NULL,
    category TEXT NOT NULL,
    extra_info TEXT NOT NULL DEFAULT '',
    year INTEGER,
    rating REAL,
    source_url TEXT,
    scraped_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_content_natural_key ON content(title, kind);
CREATE INDEX IF NOT EXISTS idx_content_kind ON content(kind);
CREATE INDEX IF NOT EXISTS idx_content_category ON content(category);
"#;

/// Errors from the content store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid stored row: {0}")]
    Decode(String),
}

/// The persistence seam the job driver depends on.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert or update one record by natural key.
    async fn upsert(&self, record: &ContentRecord) -> Result<(), StoreError>;
}

/// A record as it exists in storage, timestamps included.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: ContentRecord,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: i64,
    pub movies: i64,
    pub series: i64,
}

type ContentRow = (
    String,         // title
    String,         // kind
    String,         // category
    String,         // extra_info
    Option<i64>,    // year
    Option<f64>,    // rating
    Option<String>, // source_url
    String,         // scraped_at
    String,         // created_at
    String,         // updated_at
);

const SELECT_COLUMNS: &str =
    "title, kind, category, extra_info, year, rating, source_url, scraped_at, created_at, updated_at";

pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{path}?mode=rwc"))
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn open_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn get(
        &self,
        title: &str,
        kind: ContentKind,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let row: Option<ContentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM content WHERE title = ? AND kind = ?"
        ))
        .bind(title)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(parse_content_row).transpose()
    }

    pub async fn all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let rows: Vec<ContentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM content ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(parse_content_row).collect()
    }

    pub async fn by_kind(&self, kind: ContentKind) -> Result<Vec<StoredRecord>, StoreError> {
        let rows: Vec<ContentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM content WHERE kind = ? ORDER BY created_at DESC"
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(parse_content_row).collect()
    }

    /// Case-insensitive title substring search.
    pub async fn search(&self, title: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let rows: Vec<ContentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM content WHERE title LIKE ? ORDER BY created_at DESC"
        ))
        .bind(format!("%{title}%"))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(parse_content_row).collect()
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content")
            .fetch_one(&self.pool)
            .await?;
        let movies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content WHERE kind = 'movie'")
            .fetch_one(&self.pool)
            .await?;
        let series: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content WHERE kind = 'series'")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            total,
            movies,
            series,
        })
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn upsert(&self, record: &ContentRecord) -> Result<(), StoreError> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM content WHERE title = ? AND kind = ?)",
        )
        .bind(&record.title)
        .bind(record.kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        let now = Utc::now().to_rfc3339();

        if exists != 0 {
            // Existing record: refresh the mutable fields, keep the
            // provenance timestamps from the first sighting.
            sqlx::query(
                r#"
                UPDATE content
                SET year = ?, category = ?, extra_info = ?, rating = ?, source_url = ?, updated_at = ?
                WHERE title = ? AND kind = ?
                "#,
            )
            .bind(record.year)
            .bind(&record.category)
            .bind(&record.extra_info)
            .bind(record.rating)
            .bind(&record.source_url)
            .bind(&now)
            .bind(&record.title)
            .bind(record.kind.as_str())
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO content (title, kind, category, extra_info, year, rating, source_url,
                    scraped_at, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.title)
            .bind(record.kind.as_str())
            .bind(&record.category)
            .bind(&record.extra_info)
            .bind(record.year)
            .bind(record.rating)
            .bind(&record.source_url)
            .bind(&now)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

fn parse_content_row(row: ContentRow) -> Result<StoredRecord, StoreError> {
    let (title, kind, category, extra_info, year, rating, source_url, scraped_at, created_at, updated_at) =
        row;

    let kind = ContentKind::parse(&kind)
        .ok_or_else(|| StoreError::Decode(format!("unknown kind '{kind}'")))?;
    let year = year
        .map(|y| i32::try_from(y).map_err(|_| StoreError::Decode(format!("year {y} out of range"))))
        .transpose()?;

    Ok(StoredRecord {
        record: ContentRecord {
            title,
            kind,
            category,
            extra_info,
            year,
            rating,
            source_url,
        },
        scraped_at: parse_timestamp(&scraped_at)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("bad timestamp '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, kind: ContentKind, year: Option<i32>) -> ContentRecord {
        ContentRecord {
            title: title.to_string(),
            kind,
            category: "Hollywood".to_string(),
            extra_info: String::new(),
            year,
            rating: None,
            source_url: Some("https://example.test/".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_then_read_back() {
        let store = SqliteStore::open_memory().await.unwrap();

        store
            .upsert(&record("Z", ContentKind::Movie, Some(2020)))
            .await
            .unwrap();

        let stored = store.get("Z", ContentKind::Movie).await.unwrap().unwrap();
        assert_eq!(stored.record.title, "Z");
        assert_eq!(stored.record.year, Some(2020));
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn test_upsert_preserves_provenance_timestamps() {
        let store = SqliteStore::open_memory().await.unwrap();

        store
            .upsert(&record("Z", ContentKind::Movie, Some(2020)))
            .await
            .unwrap();
        let first = store.get("Z", ContentKind::Movie).await.unwrap().unwrap();

        store
            .upsert(&record("Z", ContentKind::Movie, Some(2021)))
            .await
            .unwrap();
        let second = store.get("Z", ContentKind::Movie).await.unwrap().unwrap();

        assert_eq!(second.record.year, Some(2021));
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.scraped_at, first.scraped_at);
        assert!(second.updated_at >= first.updated_at);

        // Still one row: the natural key deduplicated.
        assert_eq!(store.stats().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_same_title_different_kind_are_distinct() {
        let store = SqliteStore::open_memory().await.unwrap();

        store
            .upsert(&record("Dune", ContentKind::Movie, Some(2021)))
            .await
            .unwrap();
        store
            .upsert(&record("Dune", ContentKind::Series, None))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.movies, 1);
        assert_eq!(stats.series, 1);
    }

    #[tokio::test]
    async fn test_search_and_by_kind() {
        let store = SqliteStore::open_memory().await.unwrap();

        store
            .upsert(&record("Interstellar", ContentKind::Movie, Some(2014)))
            .await
            .unwrap();
        store
            .upsert(&record("Severance", ContentKind::Series, None))
            .await
            .unwrap();

        let hits = store.search("stell").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.title, "Interstellar");

        let series = store.by_kind(ContentKind::Series).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].record.title, "Severance");
    }
}
