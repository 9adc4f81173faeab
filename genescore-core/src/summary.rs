//! Prose summary scoring
//!
//! ROUGE-L is computed here; semantic similarity and perplexity come from
//! external models behind the [`SemanticSimilarity`] and
//! [`CausalLanguageModel`] traits.

use std::sync::Arc;

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};

use crate::prediction::{parse_prediction, SummaryAnswer};
use crate::types::{Error, Result, SummaryScore};

/// Default number of new tokens scored per perplexity window
pub const DEFAULT_STRIDE: usize = 512;

/// Failure reported by an external model
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

pub type ModelResult<T> = std::result::Result<T, ModelError>;

impl From<ModelError> for Error {
    fn from(e: ModelError) -> Self {
        Error::ExternalModel(e.0)
    }
}

/// Embedding-based similarity between two texts, in `[0, 1]`.
#[async_trait]
pub trait SemanticSimilarity: Send + Sync {
    async fn similarity(&self, candidate: &str, reference: &str) -> ModelResult<f64>;
}

/// A causal language model used to measure perplexity.
#[async_trait]
pub trait CausalLanguageModel: Send + Sync {
    /// Maximum number of tokens the model attends over
    fn context_length(&self) -> usize;

    async fn tokenize(&self, text: &str) -> ModelResult<Vec<u32>>;

    /// Mean negative log-likelihood of the last `target_len` tokens of
    /// `input_ids`, each conditioned on the window tokens before it.
    async fn window_nll(&self, input_ids: &[u32], target_len: usize) -> ModelResult<f64>;
}

/// Tokens shorter than this are compared unstemmed
const MIN_STEM_LEN: usize = 4;

/// Lower-cased `[a-z0-9]` runs; tokens of four or more characters are
/// reduced with the English Snowball stemmer.
fn tokenize(text: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.len() >= MIN_STEM_LEN {
                stemmer.stem(t).into_owned()
            } else {
                t.to_string()
            }
        })
        .collect()
}

fn lcs_length(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Two rolling rows of the DP table
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// ROUGE-L F-measure (longest common subsequence over tokens)
pub fn rouge_l(reference: &str, candidate: &str) -> f64 {
    let reference = tokenize(reference);
    let candidate = tokenize(candidate);
    if reference.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&reference, &candidate) as f64;
    let precision = lcs / candidate.len() as f64;
    let recall = lcs / reference.len() as f64;
    crate::metrics::f1_score(precision, recall)
}

/// Sliding-window perplexity of `text`; returns `(perplexity, token_count)`.
///
/// Windows start every `stride` tokens and reach back at most
/// `context_length` tokens; only tokens not scored by an earlier window
/// contribute to the likelihood.
pub async fn perplexity(
    model: &dyn CausalLanguageModel,
    text: &str,
    stride: usize,
) -> Result<(f64, usize)> {
    let max_length = model.context_length();
    if stride == 0 || max_length == 0 {
        return Err(Error::Configuration(
            "stride and context length must be positive".to_string(),
        ));
    }
    let stride = stride.min(max_length);

    let ids = model.tokenize(text).await?;
    let n = ids.len();
    if n == 0 {
        return Err(Error::ExternalModel(
            "cannot compute perplexity of empty text".to_string(),
        ));
    }

    let mut nll_sum = 0.0;
    let mut start = 0;
    while start < n {
        let end = (start + stride).min(n);
        let begin = (start + stride).saturating_sub(max_length);
        let target_len = end - start;

        let mean_nll = model.window_nll(&ids[begin..end], target_len).await?;
        if !mean_nll.is_finite() {
            return Err(Error::ExternalModel(format!(
                "non-finite loss for window {}..{}",
                begin, end
            )));
        }
        nll_sum += mean_nll * target_len as f64;
        start += stride;
    }

    Ok(((nll_sum / n as f64).exp(), n))
}

/// Scores `{"summary": ...}` predictions with ROUGE-L, semantic similarity
/// and perplexity.
#[derive(Clone)]
pub struct SummaryScorer {
    similarity: Arc<dyn SemanticSimilarity>,
    language_model: Arc<dyn CausalLanguageModel>,
    stride: usize,
}

impl SummaryScorer {
    pub fn new(
        similarity: Arc<dyn SemanticSimilarity>,
        language_model: Arc<dyn CausalLanguageModel>,
    ) -> Self {
        Self {
            similarity,
            language_model,
            stride: DEFAULT_STRIDE,
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(Error::Configuration("stride must be positive".to_string()));
        }
        self.stride = stride;
        Ok(self)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `score_summary(reference_text, prediction_text)`
    pub async fn score(&self, reference: &str, prediction: &str) -> Result<SummaryScore> {
        let parsed: SummaryAnswer = parse_prediction(prediction)?;
        let summary = parsed.summary.trim();

        let rouge_l = rouge_l(reference, summary);
        let bert_f1 = self.similarity.similarity(summary, reference).await?;
        let (perplexity, token_count) =
            perplexity(self.language_model.as_ref(), summary, self.stride).await?;

        tracing::debug!(rouge_l, bert_f1, perplexity, token_count, "scored summary");

        Ok(SummaryScore {
            rouge_l,
            bert_f1,
            perplexity,
            token_count,
        })
    }
}
