//! Scoring items: one gold answer plus one raw model prediction
//!
//! Items are read from JSON Lines, one object per line:
//!
//! ```text
//! {"id": "q1", "question_type": "single_choice", "answer": "A", "prediction": "{\"answer\": \"A\"}"}
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use genescore::{AnnotationItem, ExpressionReference};

/// The six supported question types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    Designation,
    Expression,
    GoAnnotation,
    Summary,
}

impl QuestionType {
    pub fn all() -> Vec<QuestionType> {
        vec![
            QuestionType::SingleChoice,
            QuestionType::MultipleChoice,
            QuestionType::Designation,
            QuestionType::Expression,
            QuestionType::GoAnnotation,
            QuestionType::Summary,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Designation => "designation",
            QuestionType::Expression => "expression",
            QuestionType::GoAnnotation => "go_annotation",
            QuestionType::Summary => "summary",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "single_choice" | "choice" => Ok(QuestionType::SingleChoice),
            "multiple_choice" | "multi_choice" => Ok(QuestionType::MultipleChoice),
            "designation" => Ok(QuestionType::Designation),
            "expression" => Ok(QuestionType::Expression),
            "go_annotation" | "go" => Ok(QuestionType::GoAnnotation),
            "summary" => Ok(QuestionType::Summary),
            _ => Err(format!("Unknown question type: {}", s)),
        }
    }
}

/// Gold answer, shaped by the question type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "question_type", content = "answer", rename_all = "snake_case")]
pub enum Reference {
    SingleChoice(String),
    MultipleChoice(Vec<String>),
    Designation(Vec<String>),
    Expression(ExpressionReference),
    GoAnnotation(Vec<AnnotationItem>),
    Summary(String),
}

impl Reference {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Reference::SingleChoice(_) => QuestionType::SingleChoice,
            Reference::MultipleChoice(_) => QuestionType::MultipleChoice,
            Reference::Designation(_) => QuestionType::Designation,
            Reference::Expression(_) => QuestionType::Expression,
            Reference::GoAnnotation(_) => QuestionType::GoAnnotation,
            Reference::Summary(_) => QuestionType::Summary,
        }
    }

    /// Parse a reference of a known type from its bare JSON answer
    pub fn from_answer_json(question_type: QuestionType, answer: &str) -> Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_str(answer).map_err(|e| format!("invalid answer JSON: {}", e))?;
        let tagged = serde_json::json!({
            "question_type": question_type.as_str(),
            "answer": value,
        });
        serde_json::from_value(tagged)
            .map_err(|e| format!("answer does not fit {}: {}", question_type, e))
    }
}

/// One item to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringItem {
    pub id: String,
    #[serde(flatten)]
    pub reference: Reference,
    /// Raw model output
    pub prediction: String,
}

impl ScoringItem {
    pub fn new(id: impl Into<String>, reference: Reference, prediction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference,
            prediction: prediction.into(),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.reference.question_type()
    }
}

/// Error type for item loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Load items from a JSON Lines file
pub fn load_items_from_file(path: impl AsRef<Path>) -> Result<Vec<ScoringItem>, LoadError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let items = load_items_from_str(&content)?;
    tracing::info!("Loaded {} items from {}", items.len(), path.as_ref().display());
    Ok(items)
}

/// Parse JSON Lines; blank lines are skipped
pub fn load_items_from_str(content: &str) -> Result<Vec<ScoringItem>, LoadError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| LoadError::Parse {
                line: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}
