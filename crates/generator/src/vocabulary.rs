//! Template vocabulary

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::VocabularyError;

const SUBJECT: &str = "{subject}";
const ADJECTIVE: &str = "{adjective}";

/// Sentiment polarity a sample was composed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Word lists and sentence templates for synthetic posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Brands or products the post talks about
    pub subjects: Vec<String>,
    pub positive_adjectives: Vec<String>,
    pub negative_adjectives: Vec<String>,
    /// Template for positive posts, with `{subject}` and `{adjective}`
    pub positive_template: String,
    /// Template for negative posts, with `{subject}` and `{adjective}`
    pub negative_template: String,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            subjects: words(&["Sentinel", "Tesla", "Apple", "Google", "Netflix"]),
            positive_adjectives: words(&["amazing", "incredible", "fast", "reliable", "beautiful"]),
            negative_adjectives: words(&["terrible", "slow", "broken", "expensive", "ugly"]),
            positive_template: "I just tried {subject} and it is {adjective}! Best experience ever."
                .to_string(),
            negative_template:
                "My experience with {subject} was {adjective}. I want a refund immediately."
                    .to_string(),
        }
    }
}

impl Vocabulary {
    /// Check that every list is populated and both templates are complete
    pub fn validate(&self) -> Result<(), VocabularyError> {
        for (name, list) in [
            ("subjects", &self.subjects),
            ("positive_adjectives", &self.positive_adjectives),
            ("negative_adjectives", &self.negative_adjectives),
        ] {
            if list.is_empty() {
                return Err(VocabularyError::EmptyList(name));
            }
        }

        for (name, template) in [
            ("positive_template", &self.positive_template),
            ("negative_template", &self.negative_template),
        ] {
            for placeholder in [SUBJECT, ADJECTIVE] {
                if !template.contains(placeholder) {
                    return Err(VocabularyError::MissingPlaceholder {
                        template: name,
                        placeholder,
                    });
                }
            }
        }

        Ok(())
    }

    /// Compose one post. The adjective always comes from the list matching
    /// the chosen polarity.
    ///
    /// Expects a vocabulary that passed [`validate`](Self::validate).
    pub fn compose<R: Rng + ?Sized>(&self, rng: &mut R) -> (Polarity, String) {
        let subject = self.subjects.choose(rng).map(String::as_str).unwrap_or_default();

        let (polarity, adjectives, template) = if rng.gen_bool(0.5) {
            (Polarity::Positive, &self.positive_adjectives, &self.positive_template)
        } else {
            (Polarity::Negative, &self.negative_adjectives, &self.negative_template)
        };
        let adjective = adjectives.choose(rng).map(String::as_str).unwrap_or_default();

        let text = template.replace(SUBJECT, subject).replace(ADJECTIVE, adjective);
        (polarity, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_is_valid() {
        assert!(Vocabulary::default().validate().is_ok());
    }

    #[test]
    fn test_empty_list_rejected() {
        let vocabulary = Vocabulary {
            negative_adjectives: vec![],
            ..Default::default()
        };
        assert!(matches!(
            vocabulary.validate(),
            Err(VocabularyError::EmptyList("negative_adjectives"))
        ));
    }

    #[test]
    fn test_template_without_adjective_rejected() {
        let vocabulary = Vocabulary {
            positive_template: "{subject} rocks".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            vocabulary.validate(),
            Err(VocabularyError::MissingPlaceholder {
                template: "positive_template",
                ..
            })
        ));
    }

    #[test]
    fn test_both_polarities_appear() {
        let vocabulary = Vocabulary::default();
        let mut rng = StdRng::seed_from_u64(7);

        let polarities: Vec<Polarity> = (0..200).map(|_| vocabulary.compose(&mut rng).0).collect();
        assert!(polarities.contains(&Polarity::Positive));
        assert!(polarities.contains(&Polarity::Negative));
    }

    proptest! {
        #[test]
        fn prop_adjective_matches_polarity(seed in any::<u64>()) {
            let vocabulary = Vocabulary::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let (polarity, text) = vocabulary.compose(&mut rng);

            let (own, other) = match polarity {
                Polarity::Positive => (&vocabulary.positive_adjectives, &vocabulary.negative_adjectives),
                Polarity::Negative => (&vocabulary.negative_adjectives, &vocabulary.positive_adjectives),
            };
            prop_assert!(own.iter().any(|adj| text.contains(adj.as_str())));
            prop_assert!(!other.iter().any(|adj| text.contains(adj.as_str())));
            prop_assert!(vocabulary.subjects.iter().any(|s| text.contains(s.as_str())));
        }
    }
}
