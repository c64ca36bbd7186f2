//! Single-text sentiment analysis

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::manager::ModelManager;
use crate::model::ScoredLabel;
use crate::InferenceError;

/// Normalized model output for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Winning label
    pub label: String,
    /// Confidence in `label` (0.0 to 1.0)
    pub confidence: f64,
}

/// Classifies one text at a time against the managed model
#[derive(Clone)]
pub struct Analyzer {
    manager: Arc<ModelManager>,
    max_text_chars: usize,
}

impl Analyzer {
    pub fn new(manager: Arc<ModelManager>, max_text_chars: usize) -> Self {
        Self {
            manager,
            max_text_chars,
        }
    }

    /// The model manager backing this analyzer
    pub fn manager(&self) -> &Arc<ModelManager> {
        &self.manager
    }

    /// Classify `text`.
    ///
    /// Blank text and text longer than the configured limit are rejected
    /// before the model is touched. If the model has not been warmed up,
    /// this call loads it first and the caller pays the cold-start latency.
    pub async fn analyze(&self, text: &str) -> Result<Sentiment, InferenceError> {
        if text.trim().is_empty() {
            return Err(InferenceError::InvalidInput("text must not be empty".to_string()));
        }
        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(InferenceError::InvalidInput(format!(
                "text is {} characters, limit is {}",
                chars, self.max_text_chars
            )));
        }

        if !self.manager.is_ready() {
            warn!("Model not warmed up, loading on first use");
        }
        let model = self.manager.model().await?;

        let start = Instant::now();
        let scores = model.classify(text)?;
        metrics::histogram!("sentinel_inference_seconds").record(start.elapsed().as_secs_f64());

        let sentiment = normalize(scores)?;
        debug!(
            "Analyzed {} chars: {} ({:.3})",
            chars, sentiment.label, sentiment.confidence
        );
        Ok(sentiment)
    }
}

/// Reduce native model output to the top label with a valid probability
pub(crate) fn normalize(scores: Vec<ScoredLabel>) -> Result<Sentiment, InferenceError> {
    if let Some(bad) = scores.iter().find(|s| !s.score.is_finite()) {
        return Err(InferenceError::InferenceFailed(format!(
            "non-finite score {} for label {}",
            bad.score, bad.label
        )));
    }

    let top = scores
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| InferenceError::InferenceFailed("model returned no labels".to_string()))?;

    let confidence = top.score.clamp(0.0, 1.0);
    if confidence != top.score {
        warn!(
            "Clamped out-of-range confidence {} for label {}",
            top.score, top.label
        );
    }

    Ok(Sentiment {
        label: top.label,
        confidence,
    })
}
