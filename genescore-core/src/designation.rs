//! Free-text designation (protein name list) scoring

use std::collections::HashSet;

use crate::metrics::set_overlap;
use crate::prediction::{parse_prediction, DesignationAnswer};
use crate::types::Result;

fn fold(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Set F1 between case-folded reference names and predicted names
pub fn score_designation<S: AsRef<str>>(reference_names: &[S], prediction: &str) -> Result<f64> {
    let parsed: DesignationAnswer = parse_prediction(prediction)?;

    let reference: HashSet<String> = reference_names
        .iter()
        .map(|n| fold(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect();
    let predicted: HashSet<String> = parsed
        .designation
        .iter()
        .map(|n| fold(n))
        .filter(|n| !n.is_empty())
        .collect();

    Ok(set_overlap(&reference, &predicted).f1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designation_overlap() {
        let reference = ["Tumor protein p53", "Cellular tumor antigen p53"];
        let score = score_designation(
            &reference,
            r#"{"designation": ["tumor  protein P53", "p53 kinase"]}"#,
        )
        .unwrap();
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_empty_designation() {
        let score = score_designation(&["BRCA1"], r#"{"designation": []}"#).unwrap();
        assert_eq!(score, 0.0);
    }
}
