//! Word-list sentiment model

use crate::model::{ScoredLabel, SentimentModel};
use crate::InferenceError;

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "beautiful", "best", "brilliant", "enjoy", "excellent", "fantastic",
    "fast", "good", "great", "happy", "incredible", "like", "love", "perfect", "recommend",
    "reliable", "smooth", "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "angry", "awful", "bad", "broken", "disappointed", "expensive", "hate", "horrible", "poor",
    "refund", "sad", "slow", "terrible", "ugly", "unreliable", "useless", "waste", "worst",
];

const NEGATIONS: &[&str] = &["not", "no", "never", "isn't", "wasn't", "don't", "doesn't"];

/// Logit contributed by each sentiment-bearing word
const WORD_WEIGHT: f64 = 1.5;

/// Rule-based sentiment model scoring text against fixed word lists.
///
/// A negation word flips the polarity of the next sentiment word. The net
/// word count is squashed through a logistic so that text with no signal
/// scores 0.5 for both labels.
#[derive(Debug, Clone)]
pub struct LexiconModel {
    labels: Vec<String>,
}

impl LexiconModel {
    pub fn new() -> Self {
        Self {
            labels: vec!["NEGATIVE".to_string(), "POSITIVE".to_string()],
        }
    }

    fn polarity(text: &str) -> i32 {
        let mut net = 0;
        let mut negate = false;

        for word in text
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let sign = if negate { -1 } else { 1 };

            if NEGATIONS.contains(&word.as_str()) {
                negate = true;
                continue;
            }
            if POSITIVE_WORDS.contains(&word.as_str()) {
                net += sign;
                negate = false;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                net -= sign;
                negate = false;
            }
        }

        net
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for LexiconModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, text: &str) -> Result<Vec<ScoredLabel>, InferenceError> {
        let logit = Self::polarity(text) as f64 * WORD_WEIGHT;
        let positive = 1.0 / (1.0 + (-logit).exp());

        Ok(vec![
            ScoredLabel::new(self.labels[0].clone(), 1.0 - positive),
            ScoredLabel::new(self.labels[1].clone(), positive),
        ])
    }
}
