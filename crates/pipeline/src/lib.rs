//! Sentiment Ingestion Pipeline
//!
//! Composes the analyzer, the synthetic generator, and the repository into
//! the operations the HTTP layer exposes.

mod error;
mod facade;
mod retry;
mod settings;

pub use error::PipelineError;
pub use facade::{HealthReport, Pipeline, BULK_SOURCE, MANUAL_SOURCE};
pub use retry::RetryPolicy;
pub use settings::{LogFormat, PipelineConfig, ServerConfig, Settings};

pub use generator::Vocabulary;
pub use inference_engine::{ModelConfig, ModelManager};
pub use storage::{LabelCount, Repository, SentimentRecord, StorageConfig};
