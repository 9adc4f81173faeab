//! Reader for the OBO 1.2 flat-file format (term stanzas only)

use std::path::Path;

use super::graph::{OntologyBuilder, OntologyGraph, Relation, Term};
use super::LoadError;

/// Options applied while reading an OBO file
#[derive(Debug, Clone)]
pub struct OboOptions {
    pub roots: Vec<String>,
    pub follow_part_of: bool,
    pub include_obsolete: bool,
}

impl Default for OboOptions {
    fn default() -> Self {
        Self {
            roots: super::GO_ROOTS.iter().map(|r| r.to_string()).collect(),
            follow_part_of: false,
            include_obsolete: false,
        }
    }
}

/// Load an ontology graph from an `.obo` file
pub fn load_obo(path: impl AsRef<Path>, options: &OboOptions) -> Result<OntologyGraph, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let graph = parse_obo(&content, options)?;
    tracing::info!(
        path = %path.display(),
        terms = graph.len(),
        "loaded ontology"
    );
    Ok(graph)
}

#[derive(PartialEq)]
enum Stanza {
    Header,
    Term,
    Other,
}

/// Parse OBO text into an [`OntologyGraph`]
pub fn parse_obo(input: &str, options: &OboOptions) -> Result<OntologyGraph, LoadError> {
    let mut builder = OntologyBuilder::new()
        .roots(options.roots.iter().cloned())
        .follow_part_of(options.follow_part_of);

    let mut stanza = Stanza::Header;
    let mut current: Option<(usize, Term)> = None;
    let mut obsolete_skipped = 0usize;

    let mut finish = |current: &mut Option<(usize, Term)>,
                      builder: &mut OntologyBuilder|
     -> Result<(), LoadError> {
        if let Some((start, term)) = current.take() {
            if term.id.is_empty() {
                return Err(LoadError::Parse {
                    line: start,
                    message: "[Term] stanza without id".to_string(),
                });
            }
            if term.obsolete && !options.include_obsolete {
                obsolete_skipped += 1;
            } else {
                builder.add_term(term);
            }
        }
        Ok(())
    };

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            finish(&mut current, &mut builder)?;
            stanza = if line == "[Term]" {
                current = Some((line_no, Term::new(String::new())));
                Stanza::Term
            } else {
                Stanza::Other
            };
            continue;
        }

        let (tag, value) = line.split_once(':').ok_or_else(|| LoadError::Parse {
            line: line_no,
            message: format!("expected 'tag: value', got '{}'", line),
        })?;

        if stanza != Stanza::Term {
            continue;
        }
        let Some((_, term)) = current.as_mut() else {
            continue;
        };

        let value = clean_value(value);
        match tag.trim() {
            "id" => term.id = value.to_string(),
            "name" => term.name = Some(value.to_string()),
            "namespace" => term.namespace = Some(value.to_string()),
            "alt_id" => term.alt_ids.push(value.to_string()),
            "is_a" => term.parents.push((Relation::IsA, value.to_string())),
            "relationship" => {
                let mut parts = value.split_whitespace();
                if let (Some("part_of"), Some(target)) = (parts.next(), parts.next()) {
                    term.parents.push((Relation::PartOf, target.to_string()));
                }
            }
            "is_obsolete" => term.obsolete = value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }
    finish(&mut current, &mut builder)?;

    if obsolete_skipped > 0 {
        tracing::debug!(count = obsolete_skipped, "skipped obsolete terms");
    }

    Ok(builder.build())
}

/// Strip trailing `! comment` and `{qualifier}` blocks from a tag value.
fn clean_value(value: &str) -> &str {
    let value = match value.find(" !") {
        Some(pos) => &value[..pos],
        None => value,
    };
    let value = match value.find(" {") {
        Some(pos) => &value[..pos],
        None => value,
    };
    value.trim()
}
