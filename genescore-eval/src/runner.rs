//! Item dispatch and concurrent scoring

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;

use genescore::ontology::{load_obo, LoadError as OntologyLoadError, OboOptions, OntologyBuilder};
use genescore::{
    score_choice, score_designation, score_expression_with, score_multi_choice, AliasDictionaries,
    AliasError, Error, ExpressionScore, ExpressionWeights, GoScore, GoScorer, OntologyGraph,
    SummaryScore, SummaryScorer,
};

use crate::config::{Config, ConfigError};
use crate::items::{QuestionType, Reference, ScoringItem};
use crate::providers::{OpenAICompatClient, ProviderError};

/// Errors while building an [`Evaluator`]
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("ontology: {0}")]
    Ontology(#[from] OntologyLoadError),

    #[error("label dictionaries: {0}")]
    Aliases(#[from] AliasError),

    #[error("{0}")]
    Scoring(#[from] Error),

    #[error("model server: {0}")]
    Provider(#[from] ProviderError),
}

/// Score payload of one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemScore {
    Scalar { score: f64 },
    Expression(ExpressionScore),
    Go(GoScore),
    Summary(SummaryScore),
}

/// Why an item could not be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub kind: String,
    pub message: String,
}

/// Result for one item: either a score or an error, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub id: String,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ItemScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

impl ItemOutcome {
    pub fn success(id: impl Into<String>, question_type: QuestionType, score: ItemScore) -> Self {
        Self {
            id: id.into(),
            question_type,
            score: Some(score),
            error: None,
        }
    }

    pub fn failure(
        id: impl Into<String>,
        question_type: QuestionType,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question_type,
            score: None,
            error: Some(ItemError {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.score.is_some()
    }
}

/// Scores items against shared, read-only ontology data
#[derive(Clone)]
pub struct Evaluator {
    graph: Arc<OntologyGraph>,
    aliases: Arc<AliasDictionaries>,
    weights: ExpressionWeights,
    summary: Option<SummaryScorer>,
    parallel: usize,
}

impl Evaluator {
    pub fn new(graph: OntologyGraph, aliases: AliasDictionaries) -> Self {
        Self {
            graph: Arc::new(graph),
            aliases: Arc::new(aliases),
            weights: ExpressionWeights::default(),
            summary: None,
            parallel: 8,
        }
    }

    /// Load the ontology, dictionaries and model client named by `config`
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        config.validate()?;

        let options = OboOptions {
            roots: config.ontology.roots.clone(),
            follow_part_of: config.ontology.follow_part_of,
            include_obsolete: config.ontology.include_obsolete,
        };
        let graph = match &config.ontology.obo_path {
            Some(path) => load_obo(path, &options)?,
            None => {
                tracing::warn!("No ontology configured; GO terms will not be expanded");
                OntologyBuilder::new()
                    .roots(options.roots.iter().cloned())
                    .follow_part_of(options.follow_part_of)
                    .build()
            }
        };

        let mut aliases = AliasDictionaries::new();
        if let Some(path) = &config.aliases.evidence_labels_path {
            aliases = aliases.with_evidence_labels_file(path)?;
        }
        if let Some(path) = &config.aliases.labels_path {
            aliases = aliases.with_labels_file(path)?;
        }
        if config.aliases.include_ontology_names {
            let added = aliases.extend_with_ontology_names(&graph);
            tracing::debug!("Added {} labels from ontology term names", added);
        }

        let weights = ExpressionWeights::new(
            config.expression.category_weight,
            config.expression.tissue_weight,
        )?;

        let mut evaluator = Self::new(graph, aliases)
            .with_weights(weights)
            .with_parallel(config.runner.parallel_items);

        if config.summary.enabled {
            let client = Arc::new(OpenAICompatClient::from_config(&config.summary)?);
            tracing::info!("Summary scoring via {}", client.server_url());
            let scorer = SummaryScorer::new(client.clone(), client).with_stride(config.summary.stride)?;
            evaluator = evaluator.with_summary_scorer(scorer);
        }

        Ok(evaluator)
    }

    pub fn with_weights(mut self, weights: ExpressionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_summary_scorer(mut self, scorer: SummaryScorer) -> Self {
        self.summary = Some(scorer);
        self
    }

    /// Maximum number of items scored at once; at least 1
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn graph(&self) -> &OntologyGraph {
        &self.graph
    }

    pub fn aliases(&self) -> &AliasDictionaries {
        &self.aliases
    }

    /// Score one item; scoring failures become error outcomes
    pub async fn score_item(&self, item: &ScoringItem) -> ItemOutcome {
        let question_type = item.question_type();
        match self.dispatch(item).await {
            Ok(score) => ItemOutcome::success(&item.id, question_type, score),
            Err(e) => {
                match &e {
                    Error::UnresolvableReference { .. } => {
                        tracing::warn!("Item {}: {}", item.id, e)
                    }
                    Error::ExternalModel(_) => tracing::error!("Item {}: {}", item.id, e),
                    _ => tracing::debug!("Item {}: {}", item.id, e),
                }
                ItemOutcome::failure(&item.id, question_type, e.kind(), e.to_string())
            }
        }
    }

    async fn dispatch(&self, item: &ScoringItem) -> genescore::Result<ItemScore> {
        let prediction = item.prediction.as_str();
        let score = match &item.reference {
            Reference::SingleChoice(option) => ItemScore::Scalar {
                score: score_choice(option, prediction)?,
            },
            Reference::MultipleChoice(options) => ItemScore::Scalar {
                score: score_multi_choice(options, prediction)?,
            },
            Reference::Designation(names) => ItemScore::Scalar {
                score: score_designation(names, prediction)?,
            },
            Reference::Expression(reference) => {
                ItemScore::Expression(score_expression_with(reference, prediction, &self.weights)?)
            }
            Reference::GoAnnotation(reference) => {
                let scorer = GoScorer::new(&self.graph, &self.aliases);
                ItemScore::Go(scorer.score(reference, prediction)?)
            }
            Reference::Summary(reference) => {
                let scorer = self.summary.as_ref().ok_or_else(|| {
                    Error::Configuration("summary scoring is not enabled".to_string())
                })?;
                ItemScore::Summary(scorer.score(reference, prediction).await?)
            }
        };
        Ok(score)
    }

    /// Score all items concurrently, returning outcomes in input order
    pub async fn score_all(&self, items: Vec<ScoringItem>) -> Vec<ItemOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let evaluator = self.clone();
            let semaphore = semaphore.clone();
            let id = item.id.clone();
            let question_type = item.question_type();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return ItemOutcome::failure(&item.id, question_type, "internal", e.to_string())
                    }
                };
                evaluator.score_item(&item).await
            });
            handles.push((id, question_type, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, question_type, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Scoring task for item {} failed: {}", id, e);
                    ItemOutcome::failure(id, question_type, "internal", e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::info!("Scored {} items ({} failed)", outcomes.len(), failed);
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use genescore::{
        AnnotationItem, CausalLanguageModel, ExpressionReference, Labels, ModelResult,
        SemanticSimilarity, Term,
    };

    fn evaluator() -> Evaluator {
        let graph = OntologyGraph::builder()
            .term(Term::new("GO:0005575").with_name("cellular_component"))
            .term(Term::new("GO:0043226").with_name("organelle").is_a("GO:0005575"))
            .term(Term::new("GO:0005634").with_name("nucleus").is_a("GO:0043226"))
            .build();
        let mut aliases = AliasDictionaries::new();
        aliases.extend_with_ontology_names(&graph);
        Evaluator::new(graph, aliases).with_parallel(2)
    }

    struct Echo;

    #[async_trait]
    impl SemanticSimilarity for Echo {
        async fn similarity(&self, candidate: &str, reference: &str) -> ModelResult<f64> {
            Ok(if candidate == reference { 1.0 } else { 0.0 })
        }
    }

    #[async_trait]
    impl CausalLanguageModel for Echo {
        fn context_length(&self) -> usize {
            16
        }

        async fn tokenize(&self, text: &str) -> ModelResult<Vec<u32>> {
            Ok(text.split_whitespace().map(|w| w.len() as u32).collect())
        }

        async fn window_nll(&self, _input_ids: &[u32], _target_len: usize) -> ModelResult<f64> {
            Ok(0.0)
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_question_type() {
        let evaluator = evaluator();

        let choice = ScoringItem::new("c", Reference::SingleChoice("B".into()), r#"{"answer":"B"}"#);
        let outcome = evaluator.score_item(&choice).await;
        assert_eq!(outcome.score, Some(ItemScore::Scalar { score: 1.0 }));

        let go = ScoringItem::new(
            "g",
            Reference::GoAnnotation(vec![AnnotationItem::new("GO:0005634", "IDA")]),
            r#"[{"go":"located in nucleus","evidence":"IDA"}]"#,
        );
        match evaluator.score_item(&go).await.score {
            Some(ItemScore::Go(score)) => assert_eq!(score.f1, 1.0),
            other => panic!("unexpected score {:?}", other),
        }

        let expression = ScoringItem::new(
            "e",
            Reference::Expression(ExpressionReference {
                category: Labels::One("Biased expression".into()),
                tissue_list: vec!["liver".into()],
            }),
            r#"{"Category":"Biased expression","Tissue":["liver"]}"#,
        );
        match evaluator.score_item(&expression).await.score {
            Some(ItemScore::Expression(score)) => assert_eq!(score.score, 1.0),
            other => panic!("unexpected score {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_errors_become_outcomes() {
        let evaluator = evaluator();

        let malformed = ScoringItem::new("m", Reference::SingleChoice("A".into()), "A");
        let outcome = evaluator.score_item(&malformed).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.error.unwrap().kind, "malformed_prediction");

        let unresolvable = ScoringItem::new(
            "u",
            Reference::GoAnnotation(vec![AnnotationItem::new("imaginary part", "TAS")]),
            "[]",
        );
        let outcome = evaluator.score_item(&unresolvable).await;
        assert_eq!(outcome.error.unwrap().kind, "unresolvable_reference");
    }

    #[tokio::test]
    async fn test_summary_requires_scorer() {
        let item = ScoringItem::new("s", Reference::Summary("a b".into()), r#"{"summary":"a b"}"#);

        let outcome = evaluator().score_item(&item).await;
        assert_eq!(outcome.error.unwrap().kind, "configuration");

        let model = Arc::new(Echo);
        let with_summary = evaluator().with_summary_scorer(SummaryScorer::new(model.clone(), model));
        match with_summary.score_item(&item).await.score {
            Some(ItemScore::Summary(score)) => {
                assert_eq!(score.as_tuple(), (1.0, 1.0, 1.0, 2));
            }
            other => panic!("unexpected score {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_score_all_preserves_order() {
        let items: Vec<ScoringItem> = (0..10)
            .map(|i| {
                let answer = if i % 2 == 0 { "A" } else { "B" };
                ScoringItem::new(
                    format!("q{}", i),
                    Reference::SingleChoice("A".into()),
                    format!(r#"{{"answer":"{}"}}"#, answer),
                )
            })
            .collect();

        let outcomes = evaluator().score_all(items).await;
        assert_eq!(outcomes.len(), 10);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.id, format!("q{}", i));
            let expected = if i % 2 == 0 { 1.0 } else { 0.0 };
            assert_eq!(outcome.score, Some(ItemScore::Scalar { score: expected }));
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let ok = ItemOutcome::success("q1", QuestionType::SingleChoice, ItemScore::Scalar { score: 1.0 });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["score"]["score"], 1.0);
        assert!(json.get("error").is_none());

        let failed = ItemOutcome::failure("q2", QuestionType::Summary, "external_model", "down");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["question_type"], "summary");
        assert_eq!(json["error"]["kind"], "external_model");
        assert!(json.get("score").is_none());
    }

    #[test]
    fn test_from_default_config() {
        let evaluator = Evaluator::from_config(&Config::default()).unwrap();
        assert!(evaluator.graph().is_empty());
        assert_eq!(evaluator.graph().roots().len(), 3);
    }
}
