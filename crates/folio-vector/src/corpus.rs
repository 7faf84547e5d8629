//! The vector corpus: insert-with-embedding and exact cosine search.
//!
//! Embedding is best-effort. A document whose text could not be embedded is
//! still stored, without a vector, and never appears in search results.

use folio_core::Result;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::gateway::EmbeddingGateway;
use crate::similarity::cosine_similarity;
use crate::store::CorpusStore;
use crate::types::{Collection, EmbeddedDocument, Metadata, MetadataFilter, ScoredDocument};

/// Embedding gateway plus corpus store.
#[derive(Clone)]
pub struct VectorCorpus {
    gateway: Arc<EmbeddingGateway>,
    store: Arc<dyn CorpusStore>,
}

impl VectorCorpus {
    /// Create a corpus over `store`, embedding through `gateway`.
    pub fn new(gateway: Arc<EmbeddingGateway>, store: Arc<dyn CorpusStore>) -> Self {
        Self { gateway, store }
    }

    /// The embedding gateway.
    pub fn gateway(&self) -> &EmbeddingGateway {
        &self.gateway
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn CorpusStore> {
        &self.store
    }

    /// Embed `text` and append it to `collection`.
    ///
    /// Embedding failures are logged and the document is stored without a
    /// vector. Only store failures are returned as errors.
    pub async fn insert(
        &self,
        collection: Collection,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Result<EmbeddedDocument> {
        let text = text.into();
        let mut document = EmbeddedDocument::new(collection, text, metadata);

        match self.gateway.embed(&document.text).await {
            Ok(vector) => document.vector = Some(vector),
            Err(e) => log::warn!(
                "Storing {collection} document {} without a vector: {e}",
                document.id
            ),
        }

        self.store.put(document.clone()).await?;
        log::debug!(
            "Inserted {collection} document {} (embedded: {})",
            document.id,
            document.has_vector()
        );
        Ok(document)
    }

    /// Embed `text` and store it under the caller's `id`, only if a vector
    /// was produced.
    ///
    /// Returns `Ok(None)` without storing anything when embedding fails, so
    /// the same `id` can be tried again later.
    ///
    /// # Errors
    ///
    /// [`folio_core::Error::ConcurrencyConflict`] if `id` is already stored.
    pub async fn insert_embedded(
        &self,
        collection: Collection,
        id: Uuid,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Option<EmbeddedDocument>> {
        let document = EmbeddedDocument::new(collection, text, metadata).with_id(id);
        let vector = match self.gateway.embed(&document.text).await {
            Ok(vector) => vector,
            Err(e) => {
                log::warn!("Not storing {collection} document {id}: {e}");
                return Ok(None);
            }
        };

        let document = document.with_vector(vector);
        self.store.put(document.clone()).await?;
        log::debug!("Inserted {collection} document {id} under a caller id");
        Ok(Some(document))
    }

    /// Rank documents in `collection` by cosine similarity to `query`.
    ///
    /// Returns at most `top_k` hits in descending score order, ties broken by
    /// the more recent `created_at`. Documents without a usable vector are
    /// skipped. An empty collection, an empty query or `top_k == 0` yields an
    /// empty list.
    pub async fn search(
        &self,
        collection: Collection,
        query: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredDocument>> {
        if top_k == 0 || query.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.store.documents(collection).await?;
        let mut hits = rank(documents, query, filter);
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Documents in `collection` whose metadata matches `filter`, newest first.
    pub async fn find(
        &self,
        collection: Collection,
        filter: &MetadataFilter,
    ) -> Result<Vec<EmbeddedDocument>> {
        let mut documents: Vec<_> = self
            .store
            .documents(collection)
            .await?
            .into_iter()
            .filter(|d| filter.matches(&d.metadata))
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: Collection) -> Result<usize> {
        Ok(self.store.documents(collection).await?.len())
    }

    /// Number of documents in `collection` that carry a vector.
    pub async fn count_embedded(&self, collection: Collection) -> Result<usize> {
        Ok(self
            .store
            .documents(collection)
            .await?
            .iter()
            .filter(|d| d.has_vector())
            .count())
    }
}

impl std::fmt::Debug for VectorCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorCorpus")
            .field("gateway", &self.gateway)
            .field("store", &self.store.name())
            .finish()
    }
}

/// Score and sort eligible documents. Not truncated.
fn rank(
    documents: Vec<EmbeddedDocument>,
    query: &[f32],
    filter: Option<&MetadataFilter>,
) -> Vec<ScoredDocument> {
    let mut hits: Vec<ScoredDocument> = documents
        .into_iter()
        .filter(|d| filter.is_none_or(|f| f.matches(&d.metadata)))
        .filter_map(|document| {
            let score = cosine_similarity(query, document.vector.as_deref()?)?;
            Some(ScoredDocument { document, score })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.document.created_at.cmp(&a.document.created_at))
    });
    hits
}
