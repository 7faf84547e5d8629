//! Embedding gateway: the single entry point every component embeds through.
//!
//! The gateway owns the input contract (non-blank, head-truncated), the
//! timeout, and the dimension check. It never retries. A gateway built
//! without a provider reports [`EmbeddingError::NotConfigured`] on every call
//! without touching the network.

use folio_core::{EmbeddingError, head_truncate, is_blank};
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::{EmbedResult, EmbeddingProvider};
use crate::openai::OpenAiEmbeddingProvider;
use crate::types::EmbeddingConfig;

/// Wraps an optional [`EmbeddingProvider`] with the embedding contract.
#[derive(Clone)]
pub struct EmbeddingGateway {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    dimension: usize,
    max_input_chars: usize,
    timeout: Duration,
}

impl EmbeddingGateway {
    /// Gateway over `provider`, using its dimension and default limits.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let defaults = EmbeddingConfig::default();
        Self {
            dimension: provider.dimension(),
            provider: Some(provider),
            max_input_chars: defaults.max_input_chars,
            timeout: Duration::from_millis(defaults.timeout_ms),
        }
    }

    /// Gateway with no credentials.
    pub fn unconfigured(dimension: usize) -> Self {
        let defaults = EmbeddingConfig::default();
        Self {
            provider: None,
            dimension,
            max_input_chars: defaults.max_input_chars,
            timeout: Duration::from_millis(defaults.timeout_ms),
        }
    }

    /// Build the OpenAI-backed gateway described by `config`.
    ///
    /// Falls back to an unconfigured gateway when no key is present.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let gateway = match OpenAiEmbeddingProvider::from_config(config) {
            Some(provider) => Self::new(Arc::new(provider)),
            None => {
                log::info!("embedding provider not configured; vectors will be skipped");
                Self::unconfigured(config.dimension)
            }
        };
        gateway
            .with_dimension(config.dimension)
            .with_max_input_chars(config.max_input_chars)
            .with_timeout(Duration::from_millis(config.timeout_ms))
    }

    /// Override the expected vector dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Override the truncation bound.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a provider is attached.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Dimension every returned vector has.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Name of the attached provider, or `"none"`.
    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().map_or("none", |p| p.name())
    }

    /// The exact text that would be submitted for `text`.
    pub fn prepare<'a>(&self, text: &'a str) -> Option<&'a str> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(head_truncate(trimmed, self.max_input_chars))
        }
    }

    /// Embed `text`.
    ///
    /// # Errors
    ///
    /// - [`EmbeddingError::EmptyInput`] for blank input
    /// - [`EmbeddingError::NotConfigured`] when no provider is attached
    /// - [`EmbeddingError::Timeout`] when the provider exceeds the bound
    /// - [`EmbeddingError::Provider`] for provider failures
    /// - [`EmbeddingError::DimensionMismatch`] for wrong-length vectors
    pub async fn embed(&self, text: &str) -> EmbedResult {
        if is_blank(text) {
            return Err(EmbeddingError::EmptyInput);
        }
        let provider = self.provider.as_ref().ok_or(EmbeddingError::NotConfigured)?;
        let input = self.prepare(text).ok_or(EmbeddingError::EmptyInput)?;

        let vector = tokio::time::timeout(self.timeout, provider.embed(input))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

impl std::fmt::Debug for EmbeddingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGateway")
            .field("provider", &self.provider_name())
            .field("dimension", &self.dimension)
            .field("max_input_chars", &self.max_input_chars)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
