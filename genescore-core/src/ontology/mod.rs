//! Ontology graph, closure expansion and OBO loading

mod graph;
mod obo;

pub use graph::{OntologyBuilder, OntologyGraph, Relation, Term, TermSet, GO_ROOTS};
pub use obo::{load_obo, parse_obo, OboOptions};

/// Error type for ontology loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}
