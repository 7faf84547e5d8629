//! Retrieval of prior critiques and approved analyses for a query.

use chrono::{DateTime, Utc};
use folio_vector::{Collection, MetadataFilter, ScoredDocument, VectorCorpus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Retrieval limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Lower clamp for `top_k`.
    pub min_top_k: usize,
    /// Upper clamp for `top_k`.
    pub max_top_k: usize,
    /// `top_k` used when the caller gives none.
    pub default_top_k: usize,
    /// Characters of each snippet kept in augmented prompts.
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_top_k: 1,
            max_top_k: 20,
            default_top_k: 5,
            snippet_chars: 600,
        }
    }
}

impl RetrievalConfig {
    /// Clamp a requested `top_k` into the configured bounds.
    pub fn clamp_top_k(&self, top_k: usize) -> usize {
        let min = self.min_top_k.max(1);
        top_k.clamp(min, self.max_top_k.max(min))
    }
}

/// One retrieved corpus document, reduced to what prompts need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    /// Corpus document id.
    pub document_id: String,
    /// Id of the record the document was made from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// `critique_type` for critiques.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Embedded text.
    pub text: String,
    /// Cosine similarity to the query.
    pub score: f32,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
}

impl ContextSnippet {
    fn from_hit(hit: ScoredDocument, source_key: &str, kind_key: Option<&str>) -> Self {
        let document = hit.document;
        Self {
            document_id: document.id.to_string(),
            source_id: document.metadata_str(source_key).map(str::to_string),
            kind: kind_key
                .and_then(|k| document.metadata_str(k))
                .map(str::to_string),
            text: document.text,
            score: hit.score,
            created_at: document.created_at,
        }
    }
}

/// Ranked snippets from the critique and analysis collections.
///
/// The two lists are ranked independently and never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// Prior critiques, best first.
    pub critiques: Vec<ContextSnippet>,
    /// Approved analyses, best first.
    pub analyses: Vec<ContextSnippet>,
}

impl RetrievedContext {
    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.critiques.is_empty() && self.analyses.is_empty()
    }
}

/// Query-side retrieval over the corpus.
#[derive(Clone)]
pub struct RetrievalEngine {
    corpus: Arc<VectorCorpus>,
    chat_configured: bool,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Engine over `corpus`.
    ///
    /// `chat_configured` reports whether a chat service is credentialed; the
    /// engine only reports itself configured when both sides are.
    pub fn new(corpus: Arc<VectorCorpus>, chat_configured: bool) -> Self {
        Self {
            corpus,
            chat_configured,
            config: RetrievalConfig::default(),
        }
    }

    /// Override retrieval limits.
    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Retrieval limits in use.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Whether augmentation is available. Callers fall back to the
    /// unaugmented prompt otherwise.
    pub fn is_configured(&self) -> bool {
        self.chat_configured && self.corpus.gateway().is_configured()
    }

    /// Retrieve the `top_k` best critiques and approved analyses for `query`.
    ///
    /// Never fails: an unembeddable query or a failing collection yields
    /// empty lists.
    pub async fn retrieve_context(&self, query: &str, top_k: usize) -> RetrievedContext {
        let top_k = self.config.clamp_top_k(top_k);
        let vector = match self.corpus.gateway().embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                log::warn!("Retrieval skipped, query not embedded: {e}");
                return RetrievedContext::default();
            }
        };

        let critiques = self
            .search(Collection::Critique, &vector, top_k, None)
            .await
            .into_iter()
            .map(|hit| ContextSnippet::from_hit(hit, "critique_id", Some("critique_type")))
            .collect();

        let approved = MetadataFilter::new().with("approved", true);
        let analyses = self
            .search(Collection::Analysis, &vector, top_k, Some(&approved))
            .await
            .into_iter()
            .map(|hit| ContextSnippet::from_hit(hit, "feedback_id", None))
            .collect();

        let context = RetrievedContext {
            critiques,
            analyses,
        };
        log::debug!(
            "Retrieved {} critiques and {} analyses (top_k {top_k})",
            context.critiques.len(),
            context.analyses.len()
        );
        context
    }

    async fn search(
        &self,
        collection: Collection,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Vec<ScoredDocument> {
        self.corpus
            .search(collection, vector, top_k, filter)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Search of {collection} failed: {e}");
                Vec::new()
            })
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("corpus", &self.corpus)
            .field("chat_configured", &self.chat_configured)
            .field("config", &self.config)
            .finish()
    }
}
