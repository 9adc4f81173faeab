//! Immutable ontology DAG with ancestor closure

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

/// Namespace roots of the Gene Ontology (biological process, molecular
/// function, cellular component).
pub const GO_ROOTS: [&str; 3] = ["GO:0008150", "GO:0003674", "GO:0005575"];

/// A set of canonical term identifiers
pub type TermSet = HashSet<String>;

/// Kind of parent edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    IsA,
    PartOf,
}

/// A single ontology term
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub id: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub alt_ids: Vec<String>,
    pub parents: Vec<(Relation, String)>,
    pub obsolete: bool,
}

impl Term {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            namespace: None,
            alt_ids: Vec::new(),
            parents: Vec::new(),
            obsolete: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add an `is_a` parent
    pub fn is_a(mut self, parent: impl Into<String>) -> Self {
        self.parents.push((Relation::IsA, parent.into()));
        self
    }

    /// Add a `part_of` parent
    pub fn part_of(mut self, parent: impl Into<String>) -> Self {
        self.parents.push((Relation::PartOf, parent.into()));
        self
    }

    pub fn alt_id(mut self, alt: impl Into<String>) -> Self {
        self.alt_ids.push(alt.into());
        self
    }
}

/// Read-only ontology graph.
///
/// Constructed once (see [`OntologyBuilder`] and [`crate::ontology::parse_obo`])
/// and shared by reference between scoring calls.
#[derive(Debug, Clone)]
pub struct OntologyGraph {
    terms: IndexMap<String, Term>,
    alt_ids: HashMap<String, String>,
    roots: HashSet<String>,
    follow_part_of: bool,
}

impl OntologyGraph {
    pub fn builder() -> OntologyBuilder {
        OntologyBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn roots(&self) -> &HashSet<String> {
        &self.roots
    }

    pub fn follows_part_of(&self) -> bool {
        self.follow_part_of
    }

    /// Iterate terms in load order
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    /// Primary identifier for `id`, following `alt_id` aliases.
    pub fn canonical_id<'a>(&'a self, id: &str) -> Option<&'a str> {
        if let Some((key, _)) = self.terms.get_key_value(id) {
            return Some(key.as_str());
        }
        self.alt_ids.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.canonical_id(id).is_some()
    }

    pub fn term(&self, id: &str) -> Option<&Term> {
        self.canonical_id(id).and_then(|key| self.terms.get(key))
    }

    fn follows(&self, relation: Relation) -> bool {
        match relation {
            Relation::IsA => true,
            Relation::PartOf => self.follow_part_of,
        }
    }

    /// Transitive ancestors of `id`, excluding `id` itself and the root set.
    ///
    /// Identifiers absent from the graph have no ancestors.
    pub fn ancestors(&self, id: &str) -> TermSet {
        let mut found = TermSet::new();
        let Some(start) = self.canonical_id(id) else {
            return found;
        };

        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            let Some(term) = self.terms.get(current) else {
                continue;
            };
            for (relation, parent) in &term.parents {
                if !self.follows(*relation) {
                    continue;
                }
                let parent = self.canonical_id(parent).unwrap_or(parent.as_str());
                if found.insert(parent.to_string()) {
                    stack.push(parent);
                }
            }
        }

        found.remove(start);
        found.retain(|t| !self.roots.contains(t));
        found
    }

    /// Closure of a term collection: every member plus all of its ancestors,
    /// minus the root set. Members are mapped to their primary identifier;
    /// unknown members are kept as-is.
    pub fn closure<I, S>(&self, ids: I) -> TermSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut closed = TermSet::new();
        for id in ids {
            let id = id.as_ref();
            match self.canonical_id(id) {
                Some(primary) => {
                    closed.insert(primary.to_string());
                    closed.extend(self.ancestors(primary));
                }
                None => {
                    tracing::debug!(term = id, "identifier not in ontology, no ancestors");
                    closed.insert(id.to_string());
                }
            }
        }
        closed.retain(|t| !self.roots.contains(t));
        closed
    }
}

/// Builder for [`OntologyGraph`].
///
/// ```rust
/// use genescore::ontology::{OntologyGraph, Term};
///
/// let graph = OntologyGraph::builder()
///     .term(Term::new("GO:0005575").with_name("cellular_component"))
///     .term(Term::new("GO:0043226").is_a("GO:0005575"))
///     .term(Term::new("GO:0005634").with_name("nucleus").is_a("GO:0043226"))
///     .build();
///
/// assert!(graph.ancestors("GO:0005634").contains("GO:0043226"));
/// ```
#[derive(Debug, Default)]
pub struct OntologyBuilder {
    terms: IndexMap<String, Term>,
    roots: Option<HashSet<String>>,
    follow_part_of: bool,
}

impl OntologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term, replacing any earlier term with the same id.
    pub fn term(mut self, term: Term) -> Self {
        self.add_term(term);
        self
    }

    pub fn add_term(&mut self, term: Term) {
        self.terms.insert(term.id.clone(), term);
    }

    /// Override the root set (defaults to [`GO_ROOTS`]).
    pub fn roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots = Some(roots.into_iter().map(Into::into).collect());
        self
    }

    /// Also traverse `part_of` edges when computing ancestors.
    pub fn follow_part_of(mut self, follow: bool) -> Self {
        self.follow_part_of = follow;
        self
    }

    pub fn build(self) -> OntologyGraph {
        let mut alt_ids = HashMap::new();
        for term in self.terms.values() {
            for alt in &term.alt_ids {
                if !self.terms.contains_key(alt) {
                    alt_ids.insert(alt.clone(), term.id.clone());
                }
            }
        }

        let roots = self
            .roots
            .unwrap_or_else(|| GO_ROOTS.iter().map(|r| r.to_string()).collect());

        OntologyGraph {
            terms: self.terms,
            alt_ids,
            roots,
            follow_part_of: self.follow_part_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OntologyBuilder {
        OntologyGraph::builder()
            .term(Term::new("GO:0005575").with_name("cellular_component"))
            .term(Term::new("GO:0110165").is_a("GO:0005575"))
            .term(Term::new("GO:0043226").with_name("organelle").is_a("GO:0110165"))
            .term(Term::new("GO:0043227").is_a("GO:0043226"))
            .term(
                Term::new("GO:0005634")
                    .with_name("nucleus")
                    .is_a("GO:0043227")
                    .alt_id("GO:0005635x"),
            )
            .term(Term::new("GO:0031981").is_a("GO:0043233").part_of("GO:0005634"))
            .term(Term::new("GO:0043233").is_a("GO:0043226"))
    }

    #[test]
    fn test_ancestors_exclude_self_and_roots() {
        let graph = sample().build();
        let ancestors = graph.ancestors("GO:0005634");
        let expected: TermSet = ["GO:0043227", "GO:0043226", "GO:0110165"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(ancestors, expected);
    }

    #[test]
    fn test_unknown_identifier_has_no_ancestors() {
        let graph = sample().build();
        assert!(graph.ancestors("GO:9999999").is_empty());
        let closed = graph.closure(["GO:9999999"]);
        assert_eq!(closed.len(), 1);
        assert!(closed.contains("GO:9999999"));
    }

    #[test]
    fn test_part_of_only_when_enabled() {
        let graph = sample().build();
        assert!(!graph.ancestors("GO:0031981").contains("GO:0005634"));

        let graph = sample().follow_part_of(true).build();
        assert!(graph.ancestors("GO:0031981").contains("GO:0005634"));
    }

    #[test]
    fn test_alt_id_resolves_to_primary() {
        let graph = sample().build();
        assert_eq!(graph.canonical_id("GO:0005635x"), Some("GO:0005634"));
        let closed = graph.closure(["GO:0005635x"]);
        assert!(closed.contains("GO:0005634"));
        assert!(!closed.contains("GO:0005635x"));
    }

    #[test]
    fn test_closure_is_idempotent_and_drops_roots() {
        let graph = sample().build();
        let once = graph.closure(["GO:0005634", "GO:0031981", "GO:0005575"]);
        assert!(!once.contains("GO:0005575"));
        let twice = graph.closure(&once);
        assert_eq!(once, twice);
        assert!(graph.closure(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_custom_roots() {
        let graph = sample().roots(["GO:0110165"]).build();
        let closed = graph.closure(["GO:0043226"]);
        assert!(closed.contains("GO:0005575"));
        assert!(!closed.contains("GO:0110165"));
    }
}
