//! Storage Layer
//!
//! Provides SQLite persistence for sentiment records with repository pattern.

mod record;
mod repository;

pub use record::{LabelCount, NewRecord, SentimentRecord};
pub use repository::Repository;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("Limit must be positive, got {0}")]
    InvalidLimit(usize),
}

impl StorageError {
    /// Whether retrying the same operation could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if !matches!(db.kind(), sqlx::error::ErrorKind::Other) => {
                StorageError::ConstraintViolation(db.message().to_string())
            }
            _ => StorageError::DatabaseError(err.to_string()),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://sentinel.db".to_string(),
            max_connections: 5,
        }
    }
}
