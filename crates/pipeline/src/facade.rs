//! Pipeline Facade

use std::sync::Arc;

use generator::Generator;
use inference_engine::{Analyzer, ModelManager};
use serde::Serialize;
use storage::{LabelCount, NewRecord, Repository, SentimentRecord};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::retry::{with_retry, RetryPolicy};
use crate::settings::Settings;

/// Provenance tag for single ingestion without an explicit source
pub const MANUAL_SOURCE: &str = "manual";

/// Provenance tag for synthetic ingestion without an explicit source
pub const BULK_SOURCE: &str = "Simulated Twitter";

/// Readiness of the pipeline's collaborators
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub model_ready: bool,
    pub model_name: String,
    pub database_ok: bool,
    pub record_count: Option<i64>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.model_ready && self.database_ok
    }
}

/// Entry point for ingestion and queries
#[derive(Clone)]
pub struct Pipeline {
    analyzer: Analyzer,
    generator: Generator,
    repository: Repository,
    max_batch_size: usize,
    retry: RetryPolicy,
}

impl Pipeline {
    /// Assemble a pipeline from already-constructed collaborators
    pub fn new(
        manager: Arc<ModelManager>,
        repository: Repository,
        settings: &Settings,
    ) -> Result<Self, PipelineError> {
        let max_batch_size = settings.pipeline.max_batch_size;
        if max_batch_size == 0 {
            return Err(PipelineError::Configuration(
                "pipeline.max_batch_size must be positive".to_string(),
            ));
        }

        let analyzer = Analyzer::new(manager, settings.model.max_text_chars);
        let generator = Generator::new(settings.generator.clone(), analyzer.clone())?;

        Ok(Self {
            analyzer,
            generator,
            repository,
            max_batch_size,
            retry: settings.pipeline.retry_policy(),
        })
    }

    /// Open the configured store and model manager. The model is not loaded.
    pub async fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        let repository = Repository::connect(&settings.storage).await?;
        let manager = Arc::new(ModelManager::from_config(&settings.model));
        Self::new(manager, repository, settings)
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn model_manager(&self) -> &Arc<ModelManager> {
        self.analyzer.manager()
    }

    /// Load the model ahead of the first request
    pub async fn warm_up(&self) -> Result<(), PipelineError> {
        self.analyzer.manager().load().await?;
        Ok(())
    }

    /// Analyze `text` and persist the result.
    ///
    /// Nothing is stored when analysis fails. When the store keeps failing
    /// after analysis succeeded, the analysis is dropped and the error
    /// returned.
    pub async fn ingest_one(&self, text: &str, source: &str) -> Result<SentimentRecord, PipelineError> {
        let sentiment = self
            .analyzer
            .analyze(text)
            .await
            .map_err(|e| self.count_failure(e.into()))?;

        let record = NewRecord::new(
            text,
            sentiment.label,
            sentiment.confidence,
            source_or(source, MANUAL_SOURCE),
        );
        let persisted = with_retry(&self.retry, "insert_one", || {
            self.repository.insert_one(record.clone())
        })
        .await?;

        metrics::counter!("sentinel_records_ingested_total", "mode" => "single").increment(1);
        debug!(
            "Ingested record {} as {} ({:.3})",
            persisted.id, persisted.label, persisted.confidence
        );
        Ok(persisted)
    }

    /// Generate, analyze, and persist `count` synthetic posts as one unit
    pub async fn ingest_batch(&self, count: usize, source: &str) -> Result<u64, PipelineError> {
        if count > self.max_batch_size {
            return Err(PipelineError::InvalidInput(format!(
                "count {} exceeds the maximum batch size of {}",
                count, self.max_batch_size
            )));
        }

        let samples = self
            .generator
            .generate_batch(count)
            .await
            .map_err(|e| self.count_failure(e.into()))?;

        let source = source_or(source, BULK_SOURCE);
        let records: Vec<NewRecord> = samples
            .into_iter()
            .map(|s| NewRecord::new(s.text, s.label, s.confidence, source))
            .collect();

        let inserted = with_retry(&self.retry, "insert_batch", || {
            self.repository.insert_batch(records.clone())
        })
        .await?;

        metrics::counter!("sentinel_records_ingested_total", "mode" => "batch").increment(inserted);
        info!("Ingested {} synthetic records", inserted);
        Ok(inserted)
    }

    /// Most recent records, newest first
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<SentimentRecord>, PipelineError> {
        Ok(self.repository.recent_history(limit).await?)
    }

    /// Record count per label
    pub async fn sentiment_distribution(&self) -> Result<Vec<LabelCount>, PipelineError> {
        Ok(self.repository.sentiment_distribution().await?)
    }

    /// Delete all records
    pub async fn clear_all(&self) -> Result<u64, PipelineError> {
        let deleted = self.repository.clear_all().await?;
        warn!("All records cleared ({} deleted)", deleted);
        Ok(deleted)
    }

    /// Model readiness and store connectivity
    pub async fn health(&self) -> HealthReport {
        let manager = self.analyzer.manager();
        let database_ok = self.repository.ping().await.is_ok();
        let record_count = if database_ok {
            self.repository.count().await.ok()
        } else {
            None
        };

        HealthReport {
            model_ready: manager.is_ready(),
            model_name: manager.model_name(),
            database_ok,
            record_count,
        }
    }

    /// Unload the model and close the store
    pub async fn shutdown(&self) {
        self.analyzer.manager().teardown().await;
        self.repository.close().await;
        info!("Pipeline shut down");
    }

    fn count_failure(&self, err: PipelineError) -> PipelineError {
        if matches!(err, PipelineError::Inference(_) | PipelineError::ModelUnavailable(_)) {
            metrics::counter!("sentinel_inference_failures_total").increment(1);
        }
        err
    }
}

fn source_or<'a>(source: &'a str, default: &'a str) -> &'a str {
    let source = source.trim();
    if source.is_empty() {
        default
    } else {
        source
    }
}
