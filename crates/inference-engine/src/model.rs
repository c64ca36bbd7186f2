//! Model capability and loader abstractions

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::lexicon::LexiconModel;
use crate::onnx::OnnxModel;
use crate::InferenceError;

/// One label with the model's score for it, in the model's native form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f64,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A loaded sentiment classifier.
///
/// Implementations are immutable after construction and must tolerate
/// concurrent `classify` calls.
pub trait SentimentModel: Send + Sync {
    /// Labels this model can emit
    fn labels(&self) -> &[String];

    /// Score `text` against every label
    fn classify(&self, text: &str) -> Result<Vec<ScoredLabel>, InferenceError>;
}

/// Performs the (possibly slow) construction of a [`SentimentModel`].
pub trait ModelLoader: Send + Sync {
    /// Human readable name for health reporting
    fn name(&self) -> String;

    /// Build the model. Called from a blocking thread.
    fn load(&self) -> Result<Arc<dyn SentimentModel>, InferenceError>;
}

/// Model backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Built-in word-list scorer
    Lexicon,
    /// Pretrained transformer classifier exported to ONNX
    Onnx,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend to load
    pub backend: ModelBackend,
    /// Path to the ONNX file (onnx backend only)
    pub path: Option<PathBuf>,
    /// HuggingFace `tokenizer.json`; defaults to one next to `path`
    pub tokenizer_path: Option<PathBuf>,
    /// Output labels, in the order of the model's logits (onnx backend only)
    pub labels: Vec<String>,
    /// Token sequence length the graph is run at (onnx backend only)
    pub max_seq_len: usize,
    /// Longest text accepted for analysis, in characters
    pub max_text_chars: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Lexicon,
            path: None,
            tokenizer_path: None,
            labels: vec!["NEGATIVE".to_string(), "POSITIVE".to_string()],
            max_seq_len: 128,
            max_text_chars: 2000,
        }
    }
}

impl ModelConfig {
    /// Tokenizer location for the onnx backend
    pub fn resolved_tokenizer_path(&self) -> Option<PathBuf> {
        self.tokenizer_path.clone().or_else(|| {
            self.path
                .as_ref()
                .map(|path| path.with_file_name("tokenizer.json"))
        })
    }
}

/// Loader driven by [`ModelConfig`]
#[derive(Debug, Clone)]
pub struct ConfiguredLoader {
    config: ModelConfig,
}

impl ConfiguredLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for ConfiguredLoader {
    fn name(&self) -> String {
        match (self.config.backend, &self.config.path) {
            (ModelBackend::Lexicon, _) => "lexicon".to_string(),
            (ModelBackend::Onnx, Some(path)) => format!("onnx:{}", path.display()),
            (ModelBackend::Onnx, None) => "onnx".to_string(),
        }
    }

    fn load(&self) -> Result<Arc<dyn SentimentModel>, InferenceError> {
        match self.config.backend {
            ModelBackend::Lexicon => {
                info!("Loading lexicon sentiment model");
                Ok(Arc::new(LexiconModel::new()))
            }
            ModelBackend::Onnx => {
                if self.config.labels.len() < 2 {
                    return Err(InferenceError::ModelUnavailable(format!(
                        "at least two labels required, got {}",
                        self.config.labels.len()
                    )));
                }
                let path = self.config.path.as_ref().ok_or_else(|| {
                    InferenceError::ModelUnavailable("onnx backend requires model.path".to_string())
                })?;
                let tokenizer = self.config.resolved_tokenizer_path().ok_or_else(|| {
                    InferenceError::ModelUnavailable("onnx backend requires model.tokenizer_path".to_string())
                })?;

                info!(
                    "Loading ONNX sentiment model from {} (tokenizer {})",
                    path.display(),
                    tokenizer.display()
                );
                let model = OnnxModel::load(
                    path,
                    &tokenizer,
                    self.config.labels.clone(),
                    self.config.max_seq_len,
                )?;
                Ok(Arc::new(model))
            }
        }
    }
}
