//! Clients for external text models used by summary scoring

pub mod openai;

pub use openai::OpenAICompatClient;

use genescore::ModelError;

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<ProviderError> for ModelError {
    fn from(e: ProviderError) -> Self {
        ModelError(e.to_string())
    }
}
