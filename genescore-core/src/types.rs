//! Shared types: errors, annotation items and score records

use serde::{Deserialize, Serialize};

/// Errors raised while scoring a single item
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The prediction text is not the structured literal its question type expects.
    #[error("malformed prediction: {reason}")]
    MalformedPrediction { reason: String },

    /// Invalid scorer configuration, detected before any scoring work.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A gold-standard GO term that maps to no ontology identifier.
    #[error("unresolvable reference term '{label}' (evidence {evidence})")]
    UnresolvableReference { label: String, evidence: String },

    /// Failure reported by an external text model.
    #[error("external model error: {0}")]
    ExternalModel(String),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedPrediction {
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedPrediction { .. } => "malformed_prediction",
            Error::Configuration(_) => "configuration",
            Error::UnresolvableReference { .. } => "unresolvable_reference",
            Error::ExternalModel(_) => "external_model",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A `(term, evidence-code)` pair as asserted by a reference or a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationItem {
    pub go: String,
    pub evidence: String,
}

impl AnnotationItem {
    pub fn new(go: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            go: go.into(),
            evidence: evidence.into(),
        }
    }
}

/// Precision, recall and F1 of one set comparison
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SetScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Result of scoring one GO annotation item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GoScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub hallucination_rate: f64,
}

impl GoScore {
    /// `(precision, recall, f1, hallucination_rate)`
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.precision, self.recall, self.f1, self.hallucination_rate)
    }
}

/// Result of scoring one prose summary
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryScore {
    pub rouge_l: f64,
    pub bert_f1: f64,
    pub perplexity: f64,
    pub token_count: usize,
}

impl SummaryScore {
    /// `(rouge_l, bert_f1, perplexity, token_count)`
    pub fn as_tuple(&self) -> (f64, f64, f64, usize) {
        (self.rouge_l, self.bert_f1, self.perplexity, self.token_count)
    }
}
