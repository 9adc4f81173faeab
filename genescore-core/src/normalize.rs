//! Mapping of free-text GO annotations to canonical identifiers

use std::sync::LazyLock;

use regex::Regex;

use crate::aliases::{normalize_label, AliasDictionaries};
use crate::types::{AnnotationItem, Error, Result};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}:\d+").expect("identifier pattern is valid"));

/// Relation phrases that models put in front of a term label.
///
/// Tried in this order and only the first match is removed, so a longer
/// phrase must come before any phrase it starts with ("binds to " before
/// "binds ").
pub const RELATION_PREFIXES: [&str; 17] = [
    "involved in ",
    "located in ",
    "part of ",
    "enables ",
    "interacts with ",
    "binds to ",
    "encodes ",
    "activated by ",
    "regulates ",
    "binds ",
    "guides ",
    "functions as ",
    "participates in ",
    "facilitates ",
    "contains ",
    "regulated by ",
    "metabolizes ",
];

/// Outcome of resolving one predicted annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Hallucinated,
}

impl Resolution {
    pub fn id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(id) => Some(id),
            Resolution::Hallucinated => None,
        }
    }
}

/// Identifier at the start of `label`, if its first token has identifier
/// syntax (`GO:0005634 nucleus` -> `GO:0005634`).
pub fn parse_identifier(label: &str) -> Option<&str> {
    let token = label.split_whitespace().next()?;
    IDENTIFIER.find(token).map(|m| m.as_str())
}

/// Remove the first matching relation phrase (ASCII case-insensitive).
pub fn strip_relation_prefix(label: &str) -> &str {
    for prefix in RELATION_PREFIXES {
        if let Some(head) = label.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &label[prefix.len()..];
            }
        }
    }
    label
}

/// Resolves annotation labels against the alias dictionaries.
#[derive(Debug, Clone, Copy)]
pub struct TermNormalizer<'a> {
    aliases: &'a AliasDictionaries,
}

impl<'a> TermNormalizer<'a> {
    pub fn new(aliases: &'a AliasDictionaries) -> Self {
        Self { aliases }
    }

    /// Resolve a gold-standard item. The full label is tried before the
    /// prefix-stripped one, each under the evidence-qualified dictionary
    /// before the plain one; failure is a data defect.
    pub fn resolve_reference(&self, item: &AnnotationItem) -> Result<String> {
        self.resolve(&item.go, Some(&item.evidence))
            .ok_or_else(|| Error::UnresolvableReference {
                label: item.go.clone(),
                evidence: item.evidence.clone(),
            })
    }

    /// Resolve a predicted label, reporting unmappable text as hallucinated.
    ///
    /// Only the label left after removing a relation phrase is looked up.
    pub fn resolve_prediction(&self, label: &str) -> Resolution {
        match self.resolve(label, None) {
            Some(id) => Resolution::Resolved(id),
            None => {
                tracing::debug!(label, "prediction term does not map to any identifier");
                Resolution::Hallucinated
            }
        }
    }

    fn resolve(&self, label: &str, evidence: Option<&str>) -> Option<String> {
        let spaced = label.replace('_', " ");
        let spaced = spaced.trim();
        if let Some(id) = parse_identifier(spaced) {
            return Some(id.to_string());
        }

        let stripped = strip_relation_prefix(spaced).trim_start();
        if let Some(id) = parse_identifier(stripped) {
            return Some(id.to_string());
        }

        let stripped_key = normalize_label(stripped);
        let Some(evidence) = evidence else {
            return self.aliases.get_normalized(&stripped_key).map(str::to_string);
        };

        let full_key = normalize_label(spaced);
        let mut keys = vec![full_key.as_str()];
        if stripped_key != full_key {
            keys.push(stripped_key.as_str());
        }

        keys.into_iter()
            .find_map(|key| {
                self.aliases
                    .get_normalized_with_evidence(evidence, key)
                    .or_else(|| self.aliases.get_normalized(key))
            })
            .map(str::to_string)
    }
}
