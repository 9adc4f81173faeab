//! Property-based tests for closure expansion and overlap metrics

use std::collections::HashSet;

use genescore::normalize::Resolution;
use genescore::{set_overlap, HallucinationTracker, OntologyGraph, Term};
use proptest::prelude::*;

fn id(index: usize) -> String {
    format!("GO:{:07}", index)
}

/// A random DAG: node `i` may only have parents with smaller indices,
/// node 0 is the single root.
fn arb_graph() -> impl Strategy<Value = OntologyGraph> {
    (1usize..40)
        .prop_flat_map(|n| {
            prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), n)
        })
        .prop_map(|parent_choices| {
            let mut builder = OntologyGraph::builder().roots([id(0)]);
            for (i, choices) in parent_choices.iter().enumerate() {
                let mut term = Term::new(id(i));
                if i > 0 {
                    for choice in choices {
                        term = term.is_a(id(choice.index(i)));
                    }
                }
                builder = builder.term(term);
            }
            builder.build()
        })
}

fn arb_term_set() -> impl Strategy<Value = Vec<String>> {
    // Indices past the graph size exercise unknown identifiers
    prop::collection::vec((0usize..60).prop_map(id), 0..8)
}

fn arb_label_set() -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set("[a-e]{1,2}", 0..10)
}

proptest! {
    #[test]
    fn closure_is_idempotent(graph in arb_graph(), terms in arb_term_set()) {
        let once = graph.closure(&terms);
        let twice = graph.closure(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn closure_never_contains_roots(graph in arb_graph(), terms in arb_term_set()) {
        let closed = graph.closure(&terms);
        prop_assert!(!closed.contains(&id(0)));
    }

    #[test]
    fn closure_contains_every_non_root_member(graph in arb_graph(), terms in arb_term_set()) {
        let closed = graph.closure(&terms);
        for term in terms.iter().filter(|t| **t != id(0)) {
            prop_assert!(closed.contains(term));
        }
    }

    #[test]
    fn f1_is_bounded(reference in arb_label_set(), predicted in arb_label_set()) {
        let score = set_overlap(&reference, &predicted);
        prop_assert!((0.0..=1.0).contains(&score.f1));
        prop_assert!((0.0..=1.0).contains(&score.precision));
        prop_assert!((0.0..=1.0).contains(&score.recall));
    }

    #[test]
    fn f1_of_identical_sets_is_one(reference in arb_label_set()) {
        prop_assume!(!reference.is_empty());
        prop_assert_eq!(set_overlap(&reference, &reference).f1, 1.0);
        prop_assert_eq!(set_overlap(&reference, &HashSet::new()).f1, 0.0);
    }

    #[test]
    fn hallucination_rate_is_monotonic(resolved in 0usize..20, hallucinated in 0usize..20) {
        let mut tracker = HallucinationTracker::new();
        for _ in 0..resolved {
            tracker.record(&Resolution::Resolved("GO:0000001".to_string()));
        }
        for _ in 0..hallucinated {
            tracker.record(&Resolution::Hallucinated);
        }
        let before = tracker.rate();
        tracker.record(&Resolution::Hallucinated);
        prop_assert!(tracker.rate() >= before);
        prop_assert!((0.0..=1.0).contains(&tracker.rate()));
    }
}

#[test]
fn closure_of_empty_set_is_empty() {
    let graph = OntologyGraph::builder().term(Term::new(id(1))).build();
    assert!(graph.closure(Vec::<String>::new()).is_empty());
    assert_eq!(set_overlap::<String>(&HashSet::new(), &HashSet::new()).f1, 0.0);
}
