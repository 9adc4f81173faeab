//! Strict parsing of model output into per-question-type schemas
//!
//! Model output is expected to be a JSON literal, optionally wrapped in a
//! markdown code fence and/or `<s>` / `</s>` sentinel tokens. Anything that
//! does not match the schema exactly (unknown keys, wrong types, invalid
//! option letters) is rejected with [`Error::MalformedPrediction`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::types::{Error, Result};

/// A prediction literal with schema checks beyond its serde shape.
pub trait PredictionSchema: DeserializeOwned {
    fn validate(&mut self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Remove code fences and sentinel tokens around a prediction literal.
pub fn strip_wrappers(prediction: &str) -> &str {
    let mut text = prediction.trim();
    loop {
        let before = text;

        if let Some(rest) = text.strip_prefix("<s>") {
            text = rest.trim_start();
        }
        if let Some(rest) = text.strip_suffix("</s>") {
            text = rest.trim_end();
        }
        if let Some(rest) = text.strip_prefix("```") {
            let rest = match rest.get(..4) {
                Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
                _ => rest,
            };
            text = rest.trim_start();
        }
        if let Some(rest) = text.strip_suffix("```") {
            text = rest.trim_end();
        }

        if text == before {
            return text;
        }
    }
}

/// Parse and validate a prediction literal
pub fn parse_prediction<T: PredictionSchema>(prediction: &str) -> Result<T> {
    let literal = strip_wrappers(prediction);
    let mut parsed: T =
        serde_json::from_str(literal).map_err(|e| Error::malformed(e.to_string()))?;
    parsed.validate().map_err(Error::malformed)?;
    Ok(parsed)
}

/// Option letters a choice question can offer
pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Upper-case a single option letter from [`OPTION_LETTERS`], rejecting anything else
fn normalize_option(option: &str) -> std::result::Result<String, String> {
    let trimmed = option.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if OPTION_LETTERS.contains(&c.to_ascii_uppercase()) => {
            Ok(c.to_ascii_uppercase().to_string())
        }
        _ => Err(format!("'{}' is not one of the options A-D", option)),
    }
}

/// `{"answer": "A"}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceAnswer {
    pub answer: String,
}

impl PredictionSchema for ChoiceAnswer {
    fn validate(&mut self) -> std::result::Result<(), String> {
        self.answer = normalize_option(&self.answer)?;
        Ok(())
    }
}

/// `{"answers": ["A", "C"]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiChoiceAnswer {
    pub answers: Vec<String>,
}

impl PredictionSchema for MultiChoiceAnswer {
    fn validate(&mut self) -> std::result::Result<(), String> {
        self.answers = self
            .answers
            .iter()
            .map(|a| normalize_option(a))
            .collect::<std::result::Result<_, _>>()?;
        Ok(())
    }
}

/// `{"designation": ["protein1", "protein2"]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignationAnswer {
    pub designation: Vec<String>,
}

impl PredictionSchema for DesignationAnswer {}

/// `{"Tissue": ["liver"], "Category": "Biased expression"}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpressionAnswer {
    #[serde(rename = "Tissue")]
    pub tissue: Vec<String>,
    #[serde(rename = "Category")]
    pub category: String,
}

impl PredictionSchema for ExpressionAnswer {}

/// One predicted annotation, `{"go": "...", "evidence": "..."}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoItem {
    pub go: String,
    pub evidence: String,
}

/// `[{"go": "located in nucleus", "evidence": "IDA"}, ...]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct GoAnswer(pub Vec<GoItem>);

impl PredictionSchema for GoAnswer {
    fn validate(&mut self) -> std::result::Result<(), String> {
        for (idx, item) in self.0.iter().enumerate() {
            if item.go.trim().is_empty() {
                return Err(format!("item {}: empty 'go' field", idx));
            }
            if item.evidence.trim().is_empty() {
                return Err(format!("item {}: empty 'evidence' field", idx));
            }
        }
        Ok(())
    }
}

/// `{"summary": "..."}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryAnswer {
    pub summary: String,
}

impl PredictionSchema for SummaryAnswer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_wrappers() {
        assert_eq!(strip_wrappers("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_wrappers("```JSON{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_wrappers("<s> ```\n[1]\n``` </s>"), "[1]");
        assert_eq!(strip_wrappers("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_choice_answer() {
        let parsed: ChoiceAnswer = parse_prediction(r#"{"answer": " b "}"#).unwrap();
        assert_eq!(parsed.answer, "B");

        let err = parse_prediction::<ChoiceAnswer>(r#"{"answer": "B. Kinase"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedPrediction { .. }));
    }

    #[test]
    fn test_option_outside_a_to_d_rejected() {
        let err = parse_prediction::<ChoiceAnswer>(r#"{"answer": "E"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedPrediction { .. }));
        let err = parse_prediction::<MultiChoiceAnswer>(r#"{"answers": ["A", "z"]}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedPrediction { .. }));

        let parsed: ChoiceAnswer = parse_prediction(r#"{"answer": "d"}"#).unwrap();
        assert_eq!(parsed.answer, "D");
    }

    #[test]
    fn test_multi_choice_answer() {
        let parsed: MultiChoiceAnswer =
            parse_prediction("```json\n{\"answers\": [\"a\", \"C\"]}\n```").unwrap();
        assert_eq!(parsed.answers, vec!["A", "C"]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = parse_prediction::<ChoiceAnswer>(r#"{"answer": "A", "reason": "x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_brace_is_malformed() {
        let err = parse_prediction::<ChoiceAnswer>(r#"{"answer": "A""#).unwrap_err();
        assert!(matches!(err, Error::MalformedPrediction { .. }));
    }

    #[test]
    fn test_expression_answer() {
        let parsed: ExpressionAnswer = parse_prediction(
            r#"{"Tissue": ["liver", "colon"], "Category": "Biased expression"}"#,
        )
        .unwrap();
        assert_eq!(parsed.tissue, vec!["liver", "colon"]);
        assert_eq!(parsed.category, "Biased expression");
    }

    #[test]
    fn test_go_answer() {
        let parsed: GoAnswer = parse_prediction(
            r#"[{"go": "located in nucleus", "evidence": "IDA"}, {"go": "GO:0005509", "evidence": "IEA"}]"#,
        )
        .unwrap();
        assert_eq!(parsed.0.len(), 2);

        let err = parse_prediction::<GoAnswer>(r#"[{"go": "", "evidence": "IDA"}]"#);
        assert!(err.is_err());
        let err = parse_prediction::<GoAnswer>(r#"{"go": "nucleus", "evidence": "IDA"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_summary_answer() {
        let parsed: SummaryAnswer =
            parse_prediction("<s>{\"summary\": \"Encodes a kinase.\"}</s>").unwrap();
        assert_eq!(parsed.summary, "Encodes a kinase.");
    }
}
