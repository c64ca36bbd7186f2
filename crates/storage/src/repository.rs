//! Repository Implementation

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::record::{LabelCount, NewRecord, RecordRow, SentimentRecord};
use crate::{StorageConfig, StorageError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sentiment_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL CHECK (length(trim(text)) > 0),
        label TEXT NOT NULL CHECK (length(label) > 0),
        confidence REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
        source TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sentiment_results_label ON sentiment_results (label)",
];

// created_at never goes below the newest surviving record, so it sorts with id.
// The newest record is found through the primary key to keep inserts O(log n).
const INSERT: &str = "INSERT INTO sentiment_results (text, label, confidence, source, created_at)
    VALUES (?1, ?2, ?3, ?4, MAX(?5, COALESCE(
        (SELECT created_at FROM sentiment_results ORDER BY id DESC LIMIT 1), 0)))";

const COLUMNS: &str = "id, text, label, confidence, source, created_at";

/// Repository for sentiment records
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Open (creating if missing) the database described by `config`
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        info!("Opening database {}", config.database_url);

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Create a private in-memory database
    pub async fn in_memory() -> Result<Self, StorageError> {
        // Every connection to :memory: is a separate database, so pin one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        debug!("Schema ready");
        Ok(Self { pool })
    }

    /// Persist one record and return it with its assigned id and timestamp
    pub async fn insert_one(&self, record: NewRecord) -> Result<SentimentRecord, StorageError> {
        let sql = format!("{} RETURNING {}", INSERT, COLUMNS);
        let row: RecordRow = sqlx::query_as(&sql)
            .bind(&record.text)
            .bind(&record.label)
            .bind(record.confidence)
            .bind(&record.source)
            .bind(Utc::now().timestamp_millis())
            .fetch_one(&self.pool)
            .await?;

        debug!("Inserted record with ID {}", row.id);
        Ok(row.into())
    }

    /// Persist all records in one transaction. Either every record is
    /// committed or none is.
    pub async fn insert_batch(&self, records: Vec<NewRecord>) -> Result<u64, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }

        // Dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().timestamp_millis();
        let mut inserted = 0;

        for record in &records {
            inserted += sqlx::query(INSERT)
                .bind(&record.text)
                .bind(&record.label)
                .bind(record.confidence)
                .bind(&record.source)
                .bind(now)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        info!("Committed batch of {} records", inserted);
        Ok(inserted)
    }

    /// Most recent records, newest first
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<SentimentRecord>, StorageError> {
        if limit == 0 {
            return Err(StorageError::InvalidLimit(limit));
        }

        let sql = format!(
            "SELECT {} FROM sentiment_results ORDER BY id DESC LIMIT ?1",
            COLUMNS
        );
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SentimentRecord::from).collect())
    }

    /// Record count per label, most common first
    pub async fn sentiment_distribution(&self) -> Result<Vec<LabelCount>, StorageError> {
        let counts = sqlx::query_as(
            "SELECT label, COUNT(*) AS count FROM sentiment_results
             GROUP BY label ORDER BY count DESC, label ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Delete every record. The id sequence keeps counting.
    pub async fn clear_all(&self) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM sentiment_results")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        info!("Cleared {} records", deleted);
        Ok(deleted)
    }

    /// Get total record count
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM sentiment_results")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Check the database answers
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
