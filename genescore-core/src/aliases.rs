//! Free-text label to GO identifier dictionaries

use std::collections::HashMap;
use std::path::Path;

use crate::ontology::OntologyGraph;

/// Error type for dictionary loading
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Normalize a free-text label for dictionary keys and lookups.
///
/// Underscores become spaces, runs of whitespace collapse to one space,
/// and the result is lower-cased.
pub fn normalize_label(label: &str) -> String {
    label
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The two read-only label dictionaries used by term normalization.
#[derive(Debug, Clone, Default)]
pub struct AliasDictionaries {
    /// evidence code -> normalized label -> identifier
    by_evidence: HashMap<String, HashMap<String, String>>,
    /// normalized label -> identifier
    by_label: HashMap<String, String>,
}

impl AliasDictionaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw maps, normalizing every key
    pub fn from_maps(
        by_evidence: HashMap<String, HashMap<String, String>>,
        by_label: HashMap<String, String>,
    ) -> Self {
        let mut dicts = Self::new();
        for (evidence, labels) in by_evidence {
            for (label, id) in labels {
                dicts.insert_evidence_label(&evidence, &label, id);
            }
        }
        for (label, id) in by_label {
            dicts.insert_label(&label, id);
        }
        dicts
    }

    /// Parse both dictionaries from JSON text.
    ///
    /// `evidence_json` is `{"IDA": {"nucleus": "GO:0005634", ...}, ...}`,
    /// `labels_json` is `{"nucleus": "GO:0005634", ...}`.
    pub fn from_json_str(evidence_json: &str, labels_json: &str) -> Result<Self, AliasError> {
        let by_evidence = serde_json::from_str(evidence_json)?;
        let by_label = serde_json::from_str(labels_json)?;
        Ok(Self::from_maps(by_evidence, by_label))
    }

    /// Merge in an evidence-qualified dictionary file
    pub fn with_evidence_labels_file(mut self, path: impl AsRef<Path>) -> Result<Self, AliasError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let map: HashMap<String, HashMap<String, String>> = serde_json::from_str(&content)?;
        let before = self.evidence_label_count();
        for (evidence, labels) in map {
            for (label, id) in labels {
                self.insert_evidence_label(&evidence, &label, id);
            }
        }
        tracing::info!(
            path = %path.display(),
            entries = self.evidence_label_count() - before,
            "loaded evidence-qualified labels"
        );
        Ok(self)
    }

    /// Merge in a plain label dictionary file
    pub fn with_labels_file(mut self, path: impl AsRef<Path>) -> Result<Self, AliasError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let map: HashMap<String, String> = serde_json::from_str(&content)?;
        let count = map.len();
        for (label, id) in map {
            self.insert_label(&label, id);
        }
        tracing::info!(path = %path.display(), entries = count, "loaded term labels");
        Ok(self)
    }

    pub fn insert_label(&mut self, label: &str, id: impl Into<String>) {
        self.by_label.insert(normalize_label(label), id.into());
    }

    pub fn insert_evidence_label(&mut self, evidence: &str, label: &str, id: impl Into<String>) {
        self.by_evidence
            .entry(evidence.trim().to_uppercase())
            .or_default()
            .insert(normalize_label(label), id.into());
    }

    /// Add every named ontology term whose label is not already mapped.
    /// Returns the number of labels added.
    pub fn extend_with_ontology_names(&mut self, graph: &OntologyGraph) -> usize {
        let mut added = 0;
        for term in graph.terms() {
            let Some(name) = &term.name else {
                continue;
            };
            let key = normalize_label(name);
            if !self.by_label.contains_key(&key) {
                self.by_label.insert(key, term.id.clone());
                added += 1;
            }
        }
        tracing::debug!(added, "labels derived from ontology names");
        added
    }

    /// Look up a raw label in the plain dictionary
    pub fn lookup(&self, label: &str) -> Option<&str> {
        self.get_normalized(&normalize_label(label))
    }

    /// Look up a raw label under an evidence code
    pub fn lookup_with_evidence(&self, evidence: &str, label: &str) -> Option<&str> {
        self.get_normalized_with_evidence(evidence, &normalize_label(label))
    }

    pub(crate) fn get_normalized(&self, key: &str) -> Option<&str> {
        self.by_label.get(key).map(String::as_str)
    }

    pub(crate) fn get_normalized_with_evidence(&self, evidence: &str, key: &str) -> Option<&str> {
        self.by_evidence
            .get(&evidence.trim().to_uppercase())
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }

    pub fn label_count(&self) -> usize {
        self.by_label.len()
    }

    pub fn evidence_label_count(&self) -> usize {
        self.by_evidence.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::Term;
    use std::io::Write;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Calcium_ion   Binding "), "calcium ion binding");
        assert_eq!(normalize_label("nucleus"), "nucleus");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dicts = AliasDictionaries::from_json_str(
            r#"{"IDA": {"Nucleus": "GO:0005634"}}"#,
            r#"{"calcium ion binding": "GO:0005509"}"#,
        )
        .unwrap();

        assert_eq!(dicts.lookup("Calcium Ion Binding"), Some("GO:0005509"));
        assert_eq!(dicts.lookup_with_evidence("ida", "nucleus"), Some("GO:0005634"));
        assert_eq!(dicts.lookup_with_evidence("IMP", "nucleus"), None);
        assert_eq!(dicts.lookup("nucleus"), None);
    }

    #[test]
    fn test_extend_with_ontology_names_keeps_existing() {
        let graph = OntologyGraph::builder()
            .term(Term::new("GO:0005634").with_name("nucleus"))
            .term(Term::new("GO:0005509").with_name("calcium ion binding"))
            .term(Term::new("GO:0000001"))
            .build();

        let mut dicts = AliasDictionaries::new();
        dicts.insert_label("nucleus", "GO:1111111");
        let added = dicts.extend_with_ontology_names(&graph);

        assert_eq!(added, 1);
        assert_eq!(dicts.lookup("nucleus"), Some("GO:1111111"));
        assert_eq!(dicts.lookup("calcium ion binding"), Some("GO:0005509"));
    }

    #[test]
    fn test_load_from_files() {
        let mut evidence = tempfile::NamedTempFile::new().unwrap();
        write!(evidence, r#"{{"IEA": {{"nucleus": "GO:0005634"}}}}"#).unwrap();
        let mut labels = tempfile::NamedTempFile::new().unwrap();
        write!(labels, r#"{{"nucleus": "GO:0005634", "cytosol": "GO:0005829"}}"#).unwrap();

        let dicts = AliasDictionaries::new()
            .with_evidence_labels_file(evidence.path())
            .unwrap()
            .with_labels_file(labels.path())
            .unwrap();

        assert_eq!(dicts.evidence_label_count(), 1);
        assert_eq!(dicts.label_count(), 2);
    }

    #[test]
    fn test_bad_json_is_reported() {
        let err = AliasDictionaries::from_json_str("{", "{}").unwrap_err();
        assert!(matches!(err, AliasError::Json(_)));
    }
}
