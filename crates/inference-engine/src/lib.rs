//! Sentiment Inference Engine
//!
//! Owns the lifecycle of the sentiment model and classifies text with it.
//! The model is an opaque capability (text in, scored labels out) loaded
//! once per [`ModelManager`] and shared read-only across concurrent callers.

mod analyzer;
mod lexicon;
mod manager;
mod model;
mod onnx;

pub use analyzer::{Analyzer, Sentiment};
pub use lexicon::LexiconModel;
pub use manager::ModelManager;
pub use model::{ConfiguredLoader, ModelBackend, ModelConfig, ModelLoader, ScoredLabel, SentimentModel};
pub use onnx::OnnxModel;

use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Text rejected before reaching the model
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Model could not be initialized
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// Model failed on an accepted input
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}
