//! Synthetic Data Generator
//!
//! Produces templated social-media posts with a weak sentiment signal and
//! runs each one through the analyzer. Persistence is left to the caller.

mod generator;
mod vocabulary;

pub use generator::{AnalyzedSample, Generator};
pub use vocabulary::{Polarity, Vocabulary};

use thiserror::Error;

/// Vocabulary validation errors
#[derive(Debug, Clone, Error)]
pub enum VocabularyError {
    /// A word list has no entries
    #[error("Vocabulary list '{0}' is empty")]
    EmptyList(&'static str),
    /// A template lacks a required placeholder
    #[error("Template '{template}' is missing placeholder {placeholder}")]
    MissingPlaceholder {
        template: &'static str,
        placeholder: &'static str,
    },
}
