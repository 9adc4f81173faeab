//! Scoring runner for gene-biology question answering
//!
//! Wraps the `genescore` metrics with everything a scoring run needs:
//! TOML configuration, JSON Lines item loading, prompt rendering, an
//! OpenAI-compatible model-server client for summary scoring and a
//! concurrent item runner.
//!
//! # Example
//!
//! ```no_run
//! use genescore_eval::{
//!     config::Config,
//!     items::load_items_from_file,
//!     runner::Evaluator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default()?;
//!     let evaluator = Evaluator::from_config(&config)?;
//!
//!     let items = load_items_from_file("predictions.jsonl")?;
//!     for outcome in evaluator.score_all(items).await {
//!         println!("{}", serde_json::to_string(&outcome)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod items;
pub mod prompts;
pub mod providers;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::items::{
        load_items_from_file, load_items_from_str, QuestionType, Reference, ScoringItem,
    };
    pub use crate::prompts::{render_prompt, QuestionRecord};
    pub use crate::providers::{OpenAICompatClient, ProviderError, ProviderResult};
    pub use crate::runner::{Evaluator, ItemError, ItemOutcome, ItemScore, SetupError};
}
