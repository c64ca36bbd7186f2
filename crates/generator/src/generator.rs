//! Batch generation and analysis

use inference_engine::{Analyzer, InferenceError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::vocabulary::Vocabulary;
use crate::VocabularyError;

/// Generated text with the model's verdict on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedSample {
    pub text: String,
    pub label: String,
    pub confidence: f64,
}

/// Synthetic post generator
#[derive(Clone)]
pub struct Generator {
    vocabulary: Vocabulary,
    analyzer: Analyzer,
}

impl Generator {
    /// Create a generator over a validated vocabulary
    pub fn new(vocabulary: Vocabulary, analyzer: Analyzer) -> Result<Self, VocabularyError> {
        vocabulary.validate()?;
        Ok(Self {
            vocabulary,
            analyzer,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Generate one post
    pub fn generate_sample(&self) -> String {
        self.generate_sample_with(&mut rand::thread_rng())
    }

    /// Generate one post from a caller-supplied random source
    pub fn generate_sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.vocabulary.compose(rng).1
    }

    /// Generate and analyze `count` posts, in order.
    ///
    /// The first analysis failure aborts the batch and is returned as is;
    /// no partial batch is ever handed back.
    pub async fn generate_batch(&self, count: usize) -> Result<Vec<AnalyzedSample>, InferenceError> {
        info!("Generating {} synthetic posts", count);
        let mut samples = Vec::with_capacity(count);

        for _ in 0..count {
            let text = self.generate_sample();
            let sentiment = self.analyzer.analyze(&text).await?;
            debug!("Generated: {} -> {}", text, sentiment.label);

            samples.push(AnalyzedSample {
                text,
                label: sentiment.label,
                confidence: sentiment.confidence,
            });
        }

        Ok(samples)
    }
}
