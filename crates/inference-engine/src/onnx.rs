//! ONNX sentiment model using tract

use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::model::{ScoredLabel, SentimentModel};
use crate::InferenceError;

/// Token ids, attention mask and segment ids for one text, each of length
/// `max_seq_len`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedText {
    pub ids: Vec<i64>,
    pub mask: Vec<i64>,
    pub type_ids: Vec<i64>,
}

/// HuggingFace tokenizer fixed to a padded, truncated sequence length
pub(crate) struct TextEncoder {
    tokenizer: Tokenizer,
    max_seq_len: usize,
}

impl TextEncoder {
    /// Load `tokenizer.json` and pin its padding and truncation
    pub fn load(path: &Path, max_seq_len: usize) -> Result<Self, InferenceError> {
        if max_seq_len == 0 {
            return Err(InferenceError::ModelUnavailable(
                "max_seq_len must be positive".to_string(),
            ));
        }
        if !path.exists() {
            return Err(InferenceError::ModelUnavailable(format!(
                "tokenizer not found: {}",
                path.display()
            )));
        }

        let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
            InferenceError::ModelUnavailable(format!("tokenizer load failed: {}: {}", path.display(), e))
        })?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_len,
                ..Default::default()
            }))
            .map_err(|e| InferenceError::ModelUnavailable(format!("tokenizer truncation: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_seq_len),
            ..Default::default()
        }));

        Ok(Self {
            tokenizer,
            max_seq_len,
        })
    }

    pub fn encode(&self, text: &str) -> Result<EncodedText, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::InferenceFailed(format!("tokenization failed: {}", e)))?;

        let widen = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<_>>();
        let encoded = EncodedText {
            ids: widen(encoding.get_ids()),
            mask: widen(encoding.get_attention_mask()),
            type_ids: widen(encoding.get_type_ids()),
        };

        if encoded.ids.len() != self.max_seq_len {
            return Err(InferenceError::InferenceFailed(format!(
                "tokenizer produced {} ids, expected {}",
                encoded.ids.len(),
                self.max_seq_len
            )));
        }
        Ok(encoded)
    }
}

/// Transformer sentiment classifier exported to ONNX, e.g.
/// `distilbert-base-uncased-finetuned-sst-2-english`.
///
/// The graph takes i64 `input_ids` and `attention_mask` (and optionally
/// `token_type_ids`) of shape `[1, max_seq_len]` and returns one logit per
/// label.
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    encoder: TextEncoder,
    inputs: usize,
    labels: Vec<String>,
}

impl OnnxModel {
    /// Load the tokenizer, then load and optimize the graph at `path`
    pub fn load(
        path: &Path,
        tokenizer_path: &Path,
        labels: Vec<String>,
        max_seq_len: usize,
    ) -> Result<Self, InferenceError> {
        let encoder = TextEncoder::load(tokenizer_path, max_seq_len)?;
        let unavailable = |e: TractError| InferenceError::ModelUnavailable(format!("{}: {}", path.display(), e));

        let mut model = tract_onnx::onnx().model_for_path(path).map_err(unavailable)?;

        let inputs = model.input_outlets().map_err(unavailable)?.len();
        if !(2..=3).contains(&inputs) {
            return Err(InferenceError::ModelUnavailable(format!(
                "{}: expected input_ids and attention_mask inputs, graph declares {}",
                path.display(),
                inputs
            )));
        }

        for ix in 0..inputs {
            model = model
                .with_input_fact(ix, i64::fact([1, max_seq_len]).into())
                .map_err(unavailable)?;
        }

        let plan = model
            .into_optimized()
            .and_then(|model| model.into_runnable())
            .map_err(unavailable)?;

        info!(
            "ONNX model loaded: {} inputs, {} labels, sequence length {}",
            inputs,
            labels.len(),
            max_seq_len
        );

        Ok(Self {
            plan,
            encoder,
            inputs,
            labels,
        })
    }

    fn logits(&self, encoded: EncodedText) -> TractResult<Vec<f32>> {
        let len = encoded.ids.len();
        let tensor = |values: Vec<i64>| -> TractResult<TValue> {
            let tensor: Tensor = tract_ndarray::Array2::from_shape_vec((1, len), values)?.into();
            Ok(tensor.into())
        };

        let mut inputs = tvec!(tensor(encoded.ids)?, tensor(encoded.mask)?);
        if self.inputs == 3 {
            inputs.push(tensor(encoded.type_ids)?);
        }

        let outputs = self.plan.run(inputs)?;
        let logits = outputs[0].to_array_view::<f32>()?;
        Ok(logits.iter().copied().collect())
    }
}

impl SentimentModel for OnnxModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, text: &str) -> Result<Vec<ScoredLabel>, InferenceError> {
        let encoded = self.encoder.encode(text)?;
        let logits = self
            .logits(encoded)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        if logits.len() != self.labels.len() {
            return Err(InferenceError::InferenceFailed(format!(
                "model produced {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }
        debug!("ONNX logits: {:?}", logits);

        Ok(self
            .labels
            .iter()
            .zip(softmax(&logits))
            .map(|(label, score)| ScoredLabel::new(label.clone(), score))
            .collect())
    }
}

fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WORD_LEVEL_TOKENIZER: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": { "[PAD]": 0, "[UNK]": 1, "great": 2, "product": 3, "slow": 4 },
    "unk_token": "[UNK]"
  }
}"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn labels() -> Vec<String> {
        vec!["NEGATIVE".into(), "POSITIVE".into()]
    }

    #[test]
    fn test_encoder_pads_to_fixed_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tokenizer.json", WORD_LEVEL_TOKENIZER);
        let encoder = TextEncoder::load(&path, 6).unwrap();

        let encoded = encoder.encode("great product").unwrap();
        assert_eq!(encoded.ids, [2, 3, 0, 0, 0, 0]);
        assert_eq!(encoded.mask, [1, 1, 0, 0, 0, 0]);
        assert_eq!(encoded.type_ids.len(), 6);
    }

    #[test]
    fn test_encoder_truncates_long_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tokenizer.json", WORD_LEVEL_TOKENIZER);
        let encoder = TextEncoder::load(&path, 3).unwrap();

        let encoded = encoder.encode("great product slow great product").unwrap();
        assert_eq!(encoded.ids, [2, 3, 4]);
        assert_eq!(encoded.mask, [1, 1, 1]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tokenizer.json", WORD_LEVEL_TOKENIZER);
        let encoder = TextEncoder::load(&path, 2).unwrap();

        assert_eq!(encoder.encode("zebra").unwrap().ids, [1, 0]);
    }

    #[test]
    fn test_missing_tokenizer_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxModel::load(
            &dir.path().join("model.onnx"),
            &dir.path().join("tokenizer.json"),
            labels(),
            128,
        );
        assert!(matches!(result, Err(InferenceError::ModelUnavailable(_))));
    }

    #[test]
    fn test_malformed_tokenizer_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tokenizer.json", r#"{ "model": { "type": "Nope" } }"#);

        let result = TextEncoder::load(&path, 128);
        assert!(matches!(result, Err(InferenceError::ModelUnavailable(_))));
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tokenizer.json", WORD_LEVEL_TOKENIZER);

        assert!(matches!(
            TextEncoder::load(&path, 0),
            Err(InferenceError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = write_file(&dir, "tokenizer.json", WORD_LEVEL_TOKENIZER);

        let result = OnnxModel::load(Path::new("/nonexistent/sentiment.onnx"), &tokenizer, labels(), 128);
        assert!(matches!(result, Err(InferenceError::ModelUnavailable(_))));
    }

    #[test]
    fn test_non_onnx_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = write_file(&dir, "tokenizer.json", WORD_LEVEL_TOKENIZER);
        let model = write_file(&dir, "model.onnx", "not a protobuf graph");

        let result = OnnxModel::load(&model, &tokenizer, labels(), 128);
        assert!(matches!(result, Err(InferenceError::ModelUnavailable(_))));
    }

    #[test]
    fn test_softmax() {
        let probs = softmax(&[1.0, 1.0]);
        assert!((probs[0] - 0.5).abs() < 1e-9);

        let probs = softmax(&[0.0, 4.0]);
        assert!(probs[1] > 0.98);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
