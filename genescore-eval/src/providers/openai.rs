//! Client for an OpenAI-compatible model server (vLLM style)
//!
//! Embeddings back the semantic similarity score; `/tokenize` plus echoed
//! prompt logprobs from `/v1/completions` back perplexity.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use genescore::{CausalLanguageModel, ModelResult, SemanticSimilarity};

use super::{ProviderError, ProviderResult};
use crate::config::SummaryConfig;

/// HTTP client for embedding, tokenization and prompt-scoring endpoints
pub struct OpenAICompatClient {
    server_url: String,
    api_key: Option<String>,
    http_client: Client,
    embedding_model: String,
    perplexity_model: String,
    context_length: usize,
}

impl OpenAICompatClient {
    pub fn new(
        server_url: impl Into<String>,
        embedding_model: impl Into<String>,
        perplexity_model: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http_client: Client::new(),
            embedding_model: embedding_model.into(),
            perplexity_model: perplexity_model.into(),
            context_length: 1024,
        }
    }

    /// Build from the `[summary]` config section; the API key is read from
    /// the configured environment variable when it is set.
    pub fn from_config(config: &SummaryConfig) -> ProviderResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {}", e)))?;

        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::debug!("{} not set, sending unauthenticated requests", config.api_key_env);
        }

        Ok(Self {
            api_key,
            http_client,
            context_length: config.context_length,
            ..Self::new(
                config.server_url.as_str(),
                config.embedding_model.as_str(),
                config.perplexity_model.as_str(),
            )
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self
            .http_client
            .post(format!("{}{}", self.server_url, path))
            .header("Content-Type", "application/json");
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn embed(&self, inputs: [&str; 2]) -> ProviderResult<(Vec<f64>, Vec<f64>)> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
        };
        let response = check_status(self.post("/v1/embeddings").json(&body).send().await?).await?;
        let mut parsed: EmbeddingResponse = response.json().await?;

        if parsed.data.len() != 2 {
            return Err(ProviderError::Parse(format!(
                "expected 2 embeddings, got {}",
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        let second = parsed.data.pop().map(|d| d.embedding).unwrap_or_default();
        let first = parsed.data.pop().map(|d| d.embedding).unwrap_or_default();
        Ok((first, second))
    }

    async fn tokenize_text(&self, text: &str) -> ProviderResult<Vec<u32>> {
        let body = TokenizeRequest {
            model: &self.perplexity_model,
            prompt: text,
            add_special_tokens: false,
        };
        let response = check_status(self.post("/tokenize").json(&body).send().await?).await?;
        let parsed: TokenizeResponse = response.json().await?;
        Ok(parsed.tokens)
    }

    async fn prompt_logprobs(&self, input_ids: &[u32]) -> ProviderResult<Vec<Option<f64>>> {
        let body = CompletionRequest {
            model: &self.perplexity_model,
            prompt: input_ids,
            max_tokens: 1,
            echo: true,
            logprobs: 0,
            temperature: 0.0,
        };
        let response = check_status(self.post("/v1/completions").json(&body).send().await?).await?;
        let parsed: CompletionResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.logprobs)
            .map(|l| l.token_logprobs)
            .ok_or_else(|| ProviderError::Parse("No prompt logprobs in response".to_string()))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 2],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f64>,
}

#[derive(Serialize)]
struct TokenizeRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    add_special_tokens: bool,
}

#[derive(Deserialize)]
struct TokenizeResponse {
    tokens: Vec<u32>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a [u32],
    max_tokens: u32,
    echo: bool,
    logprobs: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    logprobs: Option<Logprobs>,
}

#[derive(Deserialize)]
struct Logprobs {
    token_logprobs: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(error) => error.error.message,
        Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
    };

    if status == 401 || status == 403 {
        return Err(ProviderError::Config(format!(
            "model server auth error ({}): {}",
            status.as_u16(),
            message
        )));
    }

    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Cosine similarity clamped to `[0, 1]`
pub(crate) fn cosine_similarity(a: &[f64], b: &[f64]) -> ProviderResult<f64> {
    if a.len() != b.len() || a.is_empty() {
        return Err(ProviderError::Parse(format!(
            "embedding dimensions differ or are empty ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}

/// Mean negative log-probability of the last `target_len` prompt tokens.
///
/// The server echoes one entry per prompt token plus the generated one;
/// the first prompt token has no logprob (`null`).
pub(crate) fn window_mean_nll(
    token_logprobs: &[Option<f64>],
    prompt_len: usize,
    target_len: usize,
) -> ProviderResult<f64> {
    if token_logprobs.len() < prompt_len {
        return Err(ProviderError::Parse(format!(
            "expected {} prompt logprobs, got {}",
            prompt_len,
            token_logprobs.len()
        )));
    }

    let prompt = &token_logprobs[..prompt_len];
    let targets = &prompt[prompt_len.saturating_sub(target_len)..];
    let scored: Vec<f64> = targets.iter().flatten().copied().collect();
    if scored.is_empty() {
        return Err(ProviderError::Parse("window has no scored tokens".to_string()));
    }

    Ok(-scored.iter().sum::<f64>() / scored.len() as f64)
}

#[async_trait]
impl SemanticSimilarity for OpenAICompatClient {
    async fn similarity(&self, candidate: &str, reference: &str) -> ModelResult<f64> {
        let (a, b) = self.embed([candidate, reference]).await?;
        Ok(cosine_similarity(&a, &b)?)
    }
}

#[async_trait]
impl CausalLanguageModel for OpenAICompatClient {
    fn context_length(&self) -> usize {
        self.context_length
    }

    async fn tokenize(&self, text: &str) -> ModelResult<Vec<u32>> {
        Ok(self.tokenize_text(text).await?)
    }

    async fn window_nll(&self, input_ids: &[u32], target_len: usize) -> ModelResult<f64> {
        let logprobs = self.prompt_logprobs(input_ids).await?;
        Ok(window_mean_nll(&logprobs, input_ids.len(), target_len)?)
    }
}
