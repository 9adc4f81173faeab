//! Configuration management for the scorer
//!
//! Loads ontology/dictionary locations, expression weights and external
//! model settings from a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use genescore::ontology::GO_ROOTS;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ontology: OntologyConfig,
    #[serde(default)]
    pub aliases: AliasConfig,
    #[serde(default)]
    pub expression: ExpressionConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Ontology source and traversal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// Path to an `.obo` file; without it only bare identifiers can be scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obo_path: Option<PathBuf>,
    #[serde(default = "default_roots")]
    pub roots: Vec<String>,
    #[serde(default)]
    pub follow_part_of: bool,
    #[serde(default)]
    pub include_obsolete: bool,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            obo_path: None,
            roots: default_roots(),
            follow_part_of: false,
            include_obsolete: false,
        }
    }
}

/// Label dictionary files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasConfig {
    /// `{evidence: {label: id}}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_labels_path: Option<PathBuf>,
    /// `{label: id}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_path: Option<PathBuf>,
    /// Derive labels from ontology term names
    #[serde(default = "default_true")]
    pub include_ontology_names: bool,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            evidence_labels_path: None,
            labels_path: None,
            include_ontology_names: true,
        }
    }
}

/// Expression sub-score weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionConfig {
    #[serde(default = "default_half")]
    pub category_weight: f64,
    #[serde(default = "default_half")]
    pub tissue_weight: f64,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            category_weight: default_half(),
            tissue_weight: default_half(),
        }
    }
}

/// External model server used for summary scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Root URL of an OpenAI-compatible server (`/v1/...` and `/tokenize`)
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Environment variable holding the API key, if the server needs one
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_perplexity_model")]
    pub perplexity_model: String,
    #[serde(default = "default_context_length")]
    pub context_length: usize,
    #[serde(default = "default_stride")]
    pub stride: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_url: default_server_url(),
            api_key_env: default_api_key_env(),
            embedding_model: default_embedding_model(),
            perplexity_model: default_perplexity_model(),
            context_length: default_context_length(),
            stride: default_stride(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Item scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_parallel_items")]
    pub parallel_items: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel_items: default_parallel_items(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_half() -> f64 { 0.5 }
fn default_roots() -> Vec<String> { GO_ROOTS.iter().map(|r| r.to_string()).collect() }
fn default_server_url() -> String { "http://localhost:8000".to_string() }
fn default_api_key_env() -> String { "GENESCORE_API_KEY".to_string() }
fn default_embedding_model() -> String { "bert-base-uncased".to_string() }
fn default_perplexity_model() -> String { "openai-community/gpt2".to_string() }
fn default_context_length() -> usize { 1024 }
fn default_stride() -> usize { 512 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_parallel_items() -> usize { 8 }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default config location or return defaults
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let config_paths = ["config/genescore.toml", "genescore.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                let config = Self::from_file(path)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no scoring run could use
    pub fn validate(&self) -> Result<(), ConfigError> {
        genescore::ExpressionWeights::new(
            self.expression.category_weight,
            self.expression.tissue_weight,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.ontology.roots.is_empty() {
            return Err(ConfigError::Invalid("ontology.roots must not be empty".to_string()));
        }
        if self.summary.stride == 0 || self.summary.context_length == 0 {
            return Err(ConfigError::Invalid(
                "summary.stride and summary.context_length must be positive".to_string(),
            ));
        }
        if self.summary.stride > self.summary.context_length {
            return Err(ConfigError::Invalid(format!(
                "summary.stride ({}) exceeds summary.context_length ({})",
                self.summary.stride, self.summary.context_length
            )));
        }
        if self.runner.parallel_items == 0 {
            return Err(ConfigError::Invalid("runner.parallel_items must be positive".to_string()));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
