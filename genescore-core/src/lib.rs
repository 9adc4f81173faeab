//! GeneScore - per-item scoring for gene-biology question answering
//!
//! Scores a language model's answer against the gold answer for six
//! question types: single choice, multiple choice, designation, tissue
//! expression, Gene Ontology annotation and prose summary.
//!
//! The GO scorer maps predicted terms to ontology identifiers, expands both
//! sides to their ancestor closures and reports CAFA-style precision, recall
//! and F1 together with the share of predicted terms that map to nothing.
//!
//! # Example
//!
//! ```rust
//! use genescore::{score_go, AliasDictionaries, AnnotationItem, OntologyGraph, Term};
//!
//! let graph = OntologyGraph::builder()
//!     .term(Term::new("GO:0005575").with_name("cellular_component"))
//!     .term(Term::new("GO:0043226").with_name("organelle").is_a("GO:0005575"))
//!     .term(Term::new("GO:0005634").with_name("nucleus").is_a("GO:0043226"))
//!     .build();
//!
//! let mut aliases = AliasDictionaries::new();
//! aliases.extend_with_ontology_names(&graph);
//!
//! let reference = vec![AnnotationItem::new("GO:0005634", "IDA")];
//! let prediction = r#"[{"go": "located in nucleus", "evidence": "IDA"}]"#;
//!
//! let score = score_go(&graph, &aliases, &reference, prediction).unwrap();
//! assert_eq!(score.f1, 1.0);
//! assert_eq!(score.hallucination_rate, 0.0);
//! ```

pub mod aliases;
pub mod choice;
pub mod designation;
pub mod expression;
pub mod go;
pub mod metrics;
pub mod normalize;
pub mod ontology;
pub mod prediction;
pub mod summary;
mod types;

pub use aliases::{normalize_label, AliasDictionaries, AliasError};
pub use choice::{score_choice, score_multi_choice};
pub use designation::score_designation;
pub use expression::{
    score_expression, score_expression_with, ExpressionReference, ExpressionScore,
    ExpressionWeights, Labels,
};
pub use go::{score_go, GoScorer};
pub use metrics::{f1_score, set_overlap, HallucinationTracker};
pub use normalize::{Resolution, TermNormalizer};
pub use ontology::{OntologyGraph, Term, TermSet};
pub use summary::{
    rouge_l, CausalLanguageModel, ModelError, ModelResult, SemanticSimilarity, SummaryScorer,
};
pub use types::{AnnotationItem, Error, GoScore, Result, SetScore, SummaryScore};
