//! Set-overlap metrics and hallucination accounting

use std::collections::HashSet;
use std::hash::Hash;

use crate::normalize::Resolution;
use crate::types::SetScore;

/// Precision, recall and F1 of `predicted` against `reference`.
///
/// Every undefined ratio (empty denominator, zero precision and recall)
/// resolves to 0.0.
pub fn set_overlap<T: Eq + Hash>(reference: &HashSet<T>, predicted: &HashSet<T>) -> SetScore {
    let tp = predicted.intersection(reference).count() as f64;

    let precision = if predicted.is_empty() {
        0.0
    } else {
        tp / predicted.len() as f64
    };
    let recall = if reference.is_empty() {
        0.0
    } else {
        tp / reference.len() as f64
    };

    SetScore {
        precision,
        recall,
        f1: f1_score(precision, recall),
    }
}

/// Harmonic mean of precision and recall, 0.0 when both are 0
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Counts resolvable and unresolvable prediction terms within one scoring call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HallucinationTracker {
    resolved: usize,
    hallucinated: usize,
}

impl HallucinationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Resolved(_) => self.resolved += 1,
            Resolution::Hallucinated => self.hallucinated += 1,
        }
    }

    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn hallucinated(&self) -> usize {
        self.hallucinated
    }

    /// `hallucinated / (resolved + hallucinated)`, 0.0 when nothing was recorded
    pub fn rate(&self) -> f64 {
        let total = self.resolved + self.hallucinated;
        if total == 0 {
            0.0
        } else {
            self.hallucinated as f64 / total as f64
        }
    }
}
