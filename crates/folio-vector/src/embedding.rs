//! Embedding provider trait and test implementations.
//!
//! # Providers
//!
//! - `MockEmbeddingProvider`: Deterministic fixed-dimension vectors for testing
//! - `FailingEmbeddingProvider`: Always returns the configured failure
//! - `OpenAiEmbeddingProvider`: Remote embeddings (see [`crate::openai`])

use async_trait::async_trait;
use folio_core::EmbeddingError;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Result of a single embedding call.
pub type EmbedResult = std::result::Result<Vec<f32>, EmbeddingError>;

/// A backend that turns text into a vector.
///
/// Providers are shared behind `Arc` by the gateway. They make exactly one
/// attempt per call; the gateway applies trimming, truncation, the timeout
/// and the dimension check.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one already prepared text.
    async fn embed(&self, text: &str) -> EmbedResult;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Short name for logs and status output.
    fn name(&self) -> &str;
}

// ============================================================================
// Mock provider
// ============================================================================

/// Deterministic in-process provider for tests.
///
/// Equal texts always get equal unit vectors. Specific texts can be pinned to
/// hand-picked vectors with [`MockEmbeddingProvider::with_fixture`].
#[derive(Clone)]
pub struct MockEmbeddingProvider {
    dimension: usize,
    fixtures: HashMap<String, Vec<f32>>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fixtures: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return `vector` whenever exactly `text` is embedded.
    pub fn with_fixture(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixtures.insert(text.into(), vector);
        self
    }

    /// Number of `embed` calls served so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Unit vector derived from the bytes of `text`, cycling when the text is
/// shorter than `dimension`.
fn byte_vector(text: &str, dimension: usize) -> Vec<f32> {
    let bytes = text.as_bytes();
    let mut vector: Vec<f32> = (0..dimension)
        .map(|i| {
            let byte = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            ((f32::from(byte) + i as f32) % 256.0) / 256.0
        })
        .collect();

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbedResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(vector) = self.fixtures.get(text) {
            return Ok(vector.clone());
        }
        Ok(byte_vector(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Failing provider
// ============================================================================

/// A provider that fails every call with the same error.
#[derive(Debug, Clone)]
pub struct FailingEmbeddingProvider {
    dimension: usize,
    error: EmbeddingError,
}

impl FailingEmbeddingProvider {
    /// Fail with a generic provider error.
    pub fn new(dimension: usize) -> Self {
        Self::with_error(dimension, EmbeddingError::Provider("stubbed failure".into()))
    }

    /// Fail with a specific error.
    pub fn with_error(dimension: usize, error: EmbeddingError) -> Self {
        Self { dimension, error }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> EmbedResult {
        Err(self.error.clone())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// Tests
// ============================================================================
