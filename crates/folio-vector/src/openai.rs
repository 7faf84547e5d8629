//! OpenAI-compatible embeddings provider.
//!
//! Speaks the `POST {base_url}/embeddings` protocol shared by OpenAI and most
//! self-hosted gateways. The gateway wraps every call in its own timeout, so
//! transport timeouts surface here only as provider errors.

use async_trait::async_trait;
use folio_core::EmbeddingError;
use serde::Deserialize;

use crate::embedding::{EmbedResult, EmbeddingProvider};
use crate::types::EmbeddingConfig;

/// Embedding provider backed by an OpenAI-compatible HTTP API.
pub struct OpenAiEmbeddingProvider {
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingProvider {
    /// Creates a new provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer credential
    /// * `model` - Model ID (e.g., "text-embedding-3-small")
    /// * `dimension` - Expected vector length
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: EmbeddingConfig::default().base_url,
            model: model.into(),
            dimension,
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build from configuration; `None` when no credential is configured.
    pub fn from_config(config: &EmbeddingConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let api_key = config.api_key.clone()?;
        Some(
            Self::new(api_key, config.model.clone(), config.dimension)
                .with_base_url(config.base_url.clone()),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": text,
        });
        // Only the v3 family accepts a requested output dimension.
        if self.model.starts_with("text-embedding-3") {
            body["dimensions"] = serde_json::json!(self.dimension);
        }
        body
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbedResult {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::Provider(format!(
                "HTTP {status}: {error_text}"
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("invalid response body: {e}")))?;

        body.data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| EmbeddingError::Provider("response contained no embedding".into()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "openai"
    }
}
