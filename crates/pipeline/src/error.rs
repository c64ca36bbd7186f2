//! Pipeline Error Types

use generator::VocabularyError;
use inference_engine::InferenceError;
use storage::StorageError;
use thiserror::Error;

/// Errors surfaced to pipeline callers
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller input rejected before any model or store call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model could not be loaded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Model failed on one input
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Commit failed; any computed analysis was discarded
    #[error("Persistence failed: {0}")]
    Persistence(#[source] StorageError),

    /// Settings could not be turned into a pipeline
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// Stable machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::ModelUnavailable(_) => "model_unavailable",
            PipelineError::Inference(_) => "inference_error",
            PipelineError::Persistence(_) => "persistence_error",
            PipelineError::Configuration(_) => "configuration_error",
        }
    }
}

impl From<InferenceError> for PipelineError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InvalidInput(msg) => PipelineError::InvalidInput(msg),
            InferenceError::ModelUnavailable(msg) => PipelineError::ModelUnavailable(msg),
            InferenceError::InferenceFailed(msg) => PipelineError::Inference(msg),
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidLimit(limit) => {
                PipelineError::InvalidInput(format!("limit must be positive, got {}", limit))
            }
            other => PipelineError::Persistence(other),
        }
    }
}

impl From<VocabularyError> for PipelineError {
    fn from(err: VocabularyError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_mapping() {
        let err: PipelineError = InferenceError::InvalidInput("empty".into()).into();
        assert_eq!(err.kind(), "invalid_input");

        let err: PipelineError = InferenceError::InferenceFailed("oom".into()).into();
        assert_eq!(err.kind(), "inference_error");
    }

    #[test]
    fn test_storage_mapping() {
        let err: PipelineError = StorageError::InvalidLimit(0).into();
        assert!(matches!(err, PipelineError::InvalidInput(_)));

        let err: PipelineError = StorageError::DatabaseError("disk full".into()).into();
        assert_eq!(err.kind(), "persistence_error");
        assert_eq!(err.to_string(), "Persistence failed: Database error: disk full");
    }
}
