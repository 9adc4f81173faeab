//! CAFA-style scoring of Gene Ontology annotation answers

use crate::aliases::AliasDictionaries;
use crate::metrics::{set_overlap, HallucinationTracker};
use crate::normalize::TermNormalizer;
use crate::ontology::OntologyGraph;
use crate::prediction::{parse_prediction, GoAnswer, GoItem};
use crate::types::{AnnotationItem, GoScore, Result};

/// Scores GO annotation predictions against a shared ontology and
/// dictionaries.
#[derive(Debug, Clone, Copy)]
pub struct GoScorer<'a> {
    graph: &'a OntologyGraph,
    normalizer: TermNormalizer<'a>,
}

impl<'a> GoScorer<'a> {
    pub fn new(graph: &'a OntologyGraph, aliases: &'a AliasDictionaries) -> Self {
        Self {
            graph,
            normalizer: TermNormalizer::new(aliases),
        }
    }

    /// Score raw model output against the reference annotations
    pub fn score(&self, reference: &[AnnotationItem], prediction: &str) -> Result<GoScore> {
        let predicted: GoAnswer = parse_prediction(prediction)?;
        self.score_items(reference, &predicted.0)
    }

    /// Score already-parsed prediction items
    pub fn score_items(&self, reference: &[AnnotationItem], predicted: &[GoItem]) -> Result<GoScore> {
        let reference_ids = reference
            .iter()
            .map(|item| self.normalizer.resolve_reference(item))
            .collect::<Result<Vec<_>>>()?;

        let mut tracker = HallucinationTracker::new();
        let mut predicted_ids = Vec::with_capacity(predicted.len());
        for item in predicted {
            let resolution = self.normalizer.resolve_prediction(&item.go);
            tracker.record(&resolution);
            if let Some(id) = resolution.id() {
                predicted_ids.push(id.to_string());
            }
        }

        let reference_closure = self.graph.closure(&reference_ids);
        let predicted_closure = self.graph.closure(&predicted_ids);
        let overlap = set_overlap(&reference_closure, &predicted_closure);

        tracing::debug!(
            reference_terms = reference_closure.len(),
            predicted_terms = predicted_closure.len(),
            hallucinated = tracker.hallucinated(),
            f1 = overlap.f1,
            "scored GO annotation"
        );

        Ok(GoScore {
            precision: overlap.precision,
            recall: overlap.recall,
            f1: overlap.f1,
            hallucination_rate: tracker.rate(),
        })
    }
}

/// `score_go(reference_items, prediction_text)` with explicit shared data
pub fn score_go(
    graph: &OntologyGraph,
    aliases: &AliasDictionaries,
    reference: &[AnnotationItem],
    prediction: &str,
) -> Result<GoScore> {
    GoScorer::new(graph, aliases).score(reference, prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::Term;
    use crate::types::Error;

    fn graph() -> OntologyGraph {
        OntologyGraph::builder()
            .term(Term::new("GO:0005575").with_name("cellular_component"))
            .term(Term::new("GO:0043226").with_name("organelle").is_a("GO:0005575"))
            .term(Term::new("GO:0005634").with_name("nucleus").is_a("GO:0043226"))
            .term(Term::new("GO:0005737").with_name("cytoplasm").is_a("GO:0005575"))
            .term(Term::new("GO:0003674").with_name("molecular_function"))
            .term(Term::new("GO:0005488").with_name("binding").is_a("GO:0003674"))
            .term(Term::new("GO:0005509").with_name("calcium ion binding").is_a("GO:0005488"))
            .build()
    }

    fn aliases(graph: &OntologyGraph) -> AliasDictionaries {
        let mut dicts = AliasDictionaries::new();
        dicts.extend_with_ontology_names(graph);
        dicts
    }

    #[test]
    fn test_exact_identifier_match() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("GO:0005634", "IDA")];

        let score = score_go(&graph, &dicts, &reference, r#"[{"go":"GO:0005634","evidence":"IDA"}]"#)
            .unwrap();
        assert_eq!(score.as_tuple(), (1.0, 1.0, 1.0, 0.0));
    }

    #[test]
    fn test_hallucinated_term_counts() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("nucleus", "IDA")];

        let prediction = r#"[
            {"go": "located in nucleus", "evidence": "IDA"},
            {"go": "located in the quantum foam", "evidence": "IEA"}
        ]"#;
        let score = score_go(&graph, &dicts, &reference, prediction).unwrap();
        assert_eq!(score.hallucination_rate, 0.5);
        assert_eq!(score.f1, 1.0);
    }

    #[test]
    fn test_more_general_prediction_gets_partial_credit() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("GO:0005634", "IDA")];

        // organelle is an ancestor of nucleus: reference closure {nucleus, organelle}
        let score = score_go(&graph, &dicts, &reference, r#"[{"go":"organelle","evidence":"IEA"}]"#)
            .unwrap();
        assert_eq!(score.precision, 1.0);
        assert_eq!(score.recall, 0.5);
        assert!((score.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_identifier_is_tolerated() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("GO:0005634", "IDA")];

        let score = score_go(&graph, &dicts, &reference, r#"[{"go":"GO:9999999","evidence":"IEA"}]"#)
            .unwrap();
        assert_eq!(score.f1, 0.0);
        assert_eq!(score.hallucination_rate, 0.0);
    }

    #[test]
    fn test_empty_prediction_list() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("GO:0005509", "IEA")];

        let score = score_go(&graph, &dicts, &reference, "[]").unwrap();
        assert_eq!(score, GoScore::default());
    }

    #[test]
    fn test_malformed_prediction_propagates() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("GO:0005634", "IDA")];

        let err = score_go(&graph, &dicts, &reference, r#"[{"go":"nucleus","evidence":"IDA"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPrediction { .. }));
    }

    #[test]
    fn test_unresolvable_reference_surfaces() {
        let graph = graph();
        let dicts = aliases(&graph);
        let reference = vec![AnnotationItem::new("imaginary compartment", "TAS")];

        let err = score_go(&graph, &dicts, &reference, "[]").unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { .. }));
    }
}
