//! Single- and multiple-choice scoring

use std::collections::HashSet;

use crate::metrics::set_overlap;
use crate::prediction::{parse_prediction, ChoiceAnswer, MultiChoiceAnswer};
use crate::types::Result;

/// 1.0 when the chosen option equals the reference option, else 0.0
pub fn score_choice(reference_option: &str, prediction: &str) -> Result<f64> {
    let parsed: ChoiceAnswer = parse_prediction(prediction)?;
    let matched = parsed.answer.eq_ignore_ascii_case(reference_option.trim());
    Ok(if matched { 1.0 } else { 0.0 })
}

/// Set F1 between the chosen options and the reference options
pub fn score_multi_choice<S: AsRef<str>>(reference_options: &[S], prediction: &str) -> Result<f64> {
    let parsed: MultiChoiceAnswer = parse_prediction(prediction)?;

    let reference: HashSet<String> = reference_options
        .iter()
        .map(|o| o.as_ref().trim().to_ascii_uppercase())
        .collect();
    let predicted: HashSet<String> = parsed.answers.into_iter().collect();

    Ok(set_overlap(&reference, &predicted).f1)
}
