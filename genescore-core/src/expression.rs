//! Tissue-expression scoring: weighted category match plus tissue-set F1

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::metrics::set_overlap;
use crate::prediction::{parse_prediction, ExpressionAnswer};
use crate::types::{Error, Result};

/// Tissue label assumed when the reference lists no tissues
pub const LOW_EXPRESSION: &str = "low expression";

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Weights of the category and tissue sub-scores; always sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpressionWeights {
    category: f64,
    tissue: f64,
}

impl ExpressionWeights {
    pub fn new(category: f64, tissue: f64) -> Result<Self> {
        if !category.is_finite() || !tissue.is_finite() {
            return Err(Error::Configuration("weights must be finite".to_string()));
        }
        if category < 0.0 || tissue < 0.0 {
            return Err(Error::Configuration("weights must not be negative".to_string()));
        }
        if (category + tissue - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::Configuration(format!(
                "weights must sum to 1.0, got {} + {}",
                category, tissue
            )));
        }
        Ok(Self { category, tissue })
    }

    pub fn category(&self) -> f64 {
        self.category
    }

    pub fn tissue(&self) -> f64 {
        self.tissue
    }
}

impl Default for ExpressionWeights {
    fn default() -> Self {
        Self {
            category: 0.5,
            tissue: 0.5,
        }
    }
}

/// One label or a list of labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Labels {
    One(String),
    Many(Vec<String>),
}

impl Labels {
    fn to_set(&self) -> HashSet<String> {
        let labels: Vec<&String> = match self {
            Labels::One(label) => vec![label],
            Labels::Many(labels) => labels.iter().collect(),
        };
        labels
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

impl Default for Labels {
    fn default() -> Self {
        Labels::Many(Vec::new())
    }
}

/// Gold-standard expression record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionReference {
    #[serde(default)]
    pub category: Labels,
    #[serde(default)]
    pub tissue_list: Vec<String>,
}

/// Sub-scores and weighted total of one expression item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionScore {
    pub category: f64,
    pub tissue: f64,
    pub score: f64,
}

/// `score_expression(reference, prediction, category_weight, tissue_weight)`
pub fn score_expression(
    reference: &ExpressionReference,
    prediction: &str,
    category_weight: f64,
    tissue_weight: f64,
) -> Result<f64> {
    let weights = ExpressionWeights::new(category_weight, tissue_weight)?;
    Ok(score_expression_with(reference, prediction, &weights)?.score)
}

/// Score with pre-validated weights, keeping the sub-scores
pub fn score_expression_with(
    reference: &ExpressionReference,
    prediction: &str,
    weights: &ExpressionWeights,
) -> Result<ExpressionScore> {
    let parsed: ExpressionAnswer = parse_prediction(prediction)?;

    // Strict set equality; overlapping category sets earn nothing.
    let reference_category = reference.category.to_set();
    let predicted_category = Labels::One(parsed.category).to_set();
    let category = if reference_category == predicted_category {
        1.0
    } else {
        0.0
    };

    let mut reference_tissues = lower_set(&reference.tissue_list);
    if reference_tissues.is_empty() {
        reference_tissues.insert(LOW_EXPRESSION.to_string());
    }
    let predicted_tissues = lower_set(&parsed.tissue);
    let tissue = set_overlap(&reference_tissues, &predicted_tissues).f1;

    Ok(ExpressionScore {
        category,
        tissue,
        score: category * weights.category + tissue * weights.tissue,
    })
}

fn lower_set(items: &[String]) -> HashSet<String> {
    items
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(category: &str, tissues: &[&str]) -> ExpressionReference {
        ExpressionReference {
            category: Labels::Many(vec![category.to_string()]),
            tissue_list: tissues.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_perfect_expression_match() {
        let reference = reference("Biased expression", &["liver", "colon"]);
        let prediction = r#"{"Category":"Biased expression","Tissue":["liver","colon"]}"#;
        assert_eq!(score_expression(&reference, prediction, 0.5, 0.5).unwrap(), 1.0);
    }

    #[test]
    fn test_empty_reference_tissues_mean_low_expression() {
        let reference = reference("Low expression", &[]);
        let prediction = r#"{"Category":"Low expression","Tissue":["Low Expression"]}"#;
        let score = score_expression_with(&reference, prediction, &ExpressionWeights::default())
            .unwrap();
        assert_eq!(score.tissue, 1.0);
        assert_eq!(score.score, 1.0);
    }

    #[test]
    fn test_category_mismatch_and_partial_tissues() {
        let reference = reference("Biased expression", &["liver", "colon"]);
        let prediction = r#"{"Category":"Broad expression","Tissue":["LIVER","brain"]}"#;
        let score = score_expression_with(&reference, prediction, &ExpressionWeights::default())
            .unwrap();
        assert_eq!(score.category, 0.0);
        assert_eq!(score.tissue, 0.5);
        assert_eq!(score.score, 0.25);
    }

    #[test]
    fn test_weighting() {
        let reference = reference("Biased expression", &["liver"]);
        let prediction = r#"{"Category":"Biased expression","Tissue":["brain"]}"#;
        let score = score_expression(&reference, prediction, 0.7, 0.3).unwrap();
        assert!((score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_rejected_before_parsing() {
        let reference = reference("Biased expression", &["liver"]);
        let err = score_expression(&reference, "not json", 0.6, 0.6).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(ExpressionWeights::new(-0.5, 1.5).is_err());
        assert!(ExpressionWeights::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_reference_category_accepts_string() {
        let reference: ExpressionReference =
            serde_json::from_str(r#"{"category": "Biased expression", "tissue_list": ["liver"]}"#)
                .unwrap();
        let prediction = r#"{"Category":"Biased expression","Tissue":["liver"]}"#;
        assert_eq!(score_expression(&reference, prediction, 0.5, 0.5).unwrap(), 1.0);
    }
}
