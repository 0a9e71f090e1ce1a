//! Embedding API client
//!
//! Wraps the OpenAI `/embeddings` endpoint. Every vector produced by one
//! client instance has the dimensionality configured at construction; the
//! ingestion pipeline and the query path share the same model and dimension
//! so stored and query vectors stay comparable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::model::EmbeddingConfig;
use crate::service::retry;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Character budget roughly matching the model's 8191-token input limit.
/// Longer descriptions are truncated, not rejected.
const MAX_INPUT_CHARS: usize = 24_000;

/// Batch ceiling used by the offline ingestion path
const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Caller fault (empty input, oversized batch, upstream 4xx); never retried
    #[error("Invalid embedding input: {0}")]
    InvalidInput(String),

    /// Upstream failure after the retry budget is exhausted
    #[error("Embedding service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Turns text into fixed-dimension vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for the OpenAI embeddings API
#[derive(Clone)]
pub struct OpenAiEmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
    api_key: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: EmbeddingConfig, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sengol-intel/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config,
            api_key,
        }
    }

    /// Embed multiple texts in one call.
    ///
    /// Used by offline ingestion only; the request path embeds exactly one
    /// query text per generation call.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::InvalidInput("empty batch".to_string()));
        }
        if texts.len() > MAX_BATCH_SIZE {
            return Err(EmbeddingError::InvalidInput(format!(
                "batch size {} exceeds limit of {}",
                texts.len(),
                MAX_BATCH_SIZE
            )));
        }

        let inputs = texts
            .iter()
            .map(|t| prepare_input(t))
            .collect::<Result<Vec<_>, _>>()?;

        self.request_embeddings(inputs).await
    }

    async fn request_embeddings(&self, inputs: Vec<&str>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = inputs.len();

        let vectors = retry::with_backoff(
            "openai_embeddings",
            |e: &EmbeddingError| matches!(e, EmbeddingError::ServiceUnavailable(_)),
            || self.attempt(&inputs),
        )
        .await?;

        if vectors.len() != expected {
            return Err(EmbeddingError::ServiceUnavailable(format!(
                "expected {} vectors, received {}",
                expected,
                vectors.len()
            )));
        }

        Ok(vectors)
    }

    async fn attempt(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!(
            "{}/embeddings",
            self.config.base_url.as_str().trim_end_matches('/')
        );

        let body = EmbeddingRequest {
            model: &self.config.model,
            input: inputs.to_vec(),
            dimensions: self.config.dimensions,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::InvalidInput(format!(
                "HTTP {}: {}",
                status, detail
            )));
        }
        if !status.is_success() {
            return Err(EmbeddingError::ServiceUnavailable(format!(
                "HTTP {}",
                status
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::ServiceUnavailable(e.to_string()))?;

        // The API may return entries out of order; restore input order
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = prepare_input(text)?;

        tracing::debug!(
            model = %self.config.model,
            input_chars = input.len(),
            "Requesting embedding"
        );

        let mut vectors = self.request_embeddings(vec![input]).await?;
        Ok(vectors.remove(0))
    }
}

/// Validate and bound a single embedding input
fn prepare_input(text: &str) -> Result<&str, EmbeddingError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EmbeddingError::InvalidInput(
            "embedding input must not be empty".to_string(),
        ));
    }
    Ok(truncate_chars(trimmed, MAX_INPUT_CHARS))
}

/// Truncate on a char boundary without allocating
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmbeddingConfig;

    #[tokio::test]
    async fn empty_input_is_rejected_without_network() {
        let client = OpenAiEmbeddingClient::new(EmbeddingConfig::default(), "test-key".into());
        let result = client.embed("   ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let client = OpenAiEmbeddingClient::new(EmbeddingConfig::default(), "test-key".into());
        let texts: Vec<String> = (0..MAX_BATCH_SIZE + 1).map(|i| format!("t{}", i)).collect();
        let result = client.embed_batch(&texts).await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[test]
    fn long_input_is_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_INPUT_CHARS + 50);
        let truncated = truncate_chars(&long, MAX_INPUT_CHARS);
        assert_eq!(truncated.chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_chars("hello", MAX_INPUT_CHARS), "hello");
    }

    #[tokio::test]
    #[ignore] // Requires OPENAI_API_KEY and network access
    async fn embed_returns_configured_dimension() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY");
        let config = EmbeddingConfig::default();
        let dimensions = config.dimensions;
        let client = OpenAiEmbeddingClient::new(config, api_key);
        let vector = client.embed("healthcare chatbot storing PHI").await.unwrap();
        assert_eq!(vector.len(), dimensions);
    }
}
