//! Record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analysis result not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub source: String,
}

impl NewRecord {
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            confidence,
            source: source.into(),
        }
    }
}

/// Durable sentiment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub id: i64,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Number of records carrying one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Row as stored, with `created_at` in epoch milliseconds
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecordRow {
    pub id: i64,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub source: String,
    pub created_at: i64,
}

impl From<RecordRow> for SentimentRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            label: row.label,
            confidence: row.confidence,
            source: row.source,
            created_at: DateTime::<Utc>::from_timestamp_millis(row.created_at).unwrap_or_default(),
        }
    }
}
