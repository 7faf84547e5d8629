//! The knowledge library of analytical frameworks.

use chrono::{DateTime, Utc};
use folio_core::{Error, Result, is_blank};
use folio_vector::{Collection, Metadata, MetadataFilter, VectorCorpus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::records::{FrameworkCategory, FrameworkInput, KnowledgeFrameworkEntry};
use crate::store::KnowledgeStore;

/// Result of adding a framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkAdded {
    /// The stored entry.
    pub entry: KnowledgeFrameworkEntry,
    /// Whether a vector was attached in the corpus.
    pub embedded: bool,
}

/// A framework retrieved by similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkSnippet {
    /// Source entry id, when recorded.
    pub framework_id: Option<String>,
    /// Category tag.
    pub category: Option<String>,
    /// Framework name.
    pub framework_name: Option<String>,
    /// Embedded text.
    pub text: String,
    /// Cosine similarity to the query.
    pub score: f32,
    /// When the corpus document was created.
    pub created_at: DateTime<Utc>,
}

/// Curated, low-churn analytical frameworks.
#[derive(Clone)]
pub struct KnowledgeLibrary {
    store: Arc<dyn KnowledgeStore>,
    corpus: Arc<VectorCorpus>,
}

impl KnowledgeLibrary {
    /// Library over `store`, embedding into `corpus`.
    pub fn new(store: Arc<dyn KnowledgeStore>, corpus: Arc<VectorCorpus>) -> Self {
        Self { store, corpus }
    }

    /// Add a framework and embed it.
    ///
    /// Identical input added twice yields two entries.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `category`, `framework_name`, `title` or
    /// `content` is blank.
    pub async fn add(&self, input: FrameworkInput) -> Result<FrameworkAdded> {
        for (field, value) in [
            ("category", &input.category),
            ("framework_name", &input.framework_name),
            ("title", &input.title),
            ("content", &input.content),
        ] {
            if is_blank(value) {
                return Err(Error::validation(format!("{field} must not be empty")));
            }
        }

        let entry = KnowledgeFrameworkEntry {
            id: Uuid::new_v4(),
            category: input.category.parse()?,
            framework_name: input.framework_name.trim().to_string(),
            title: input.title.trim().to_string(),
            content: input.content,
            keywords: input
                .keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            source: input.source.filter(|s| !is_blank(s)),
            created_at: Utc::now(),
        };
        self.store.insert_framework(entry.clone()).await?;

        let embedded = match self
            .corpus
            .insert(Collection::Knowledge, entry.embedding_text(), metadata(&entry))
            .await
        {
            Ok(document) => document.has_vector(),
            Err(e) => {
                log::warn!("Failed to index framework {}: {e}", entry.id);
                false
            }
        };

        log::info!(
            "Added framework {} '{}' (embedded: {embedded})",
            entry.id,
            entry.framework_name
        );
        Ok(FrameworkAdded { entry, embedded })
    }

    /// Entries, optionally in one category, newest first.
    pub async fn list(
        &self,
        category: Option<&FrameworkCategory>,
    ) -> Result<Vec<KnowledgeFrameworkEntry>> {
        let mut entries = self.store.list_frameworks(category).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Delete an entry. Its corpus document is left in place.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is unknown.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete_framework(id).await?;
        log::info!("Deleted framework {id}");
        Ok(())
    }

    /// Frameworks most similar to `query`.
    ///
    /// Fails closed: embedding or search failures yield an empty list.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        category: Option<&FrameworkCategory>,
    ) -> Vec<FrameworkSnippet> {
        let vector = match self.corpus.gateway().embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                log::debug!("Framework search skipped: {e}");
                return Vec::new();
            }
        };

        let filter = category.map(|c| MetadataFilter::new().with("category", c.as_str()));
        match self
            .corpus
            .search(Collection::Knowledge, &vector, top_k, filter.as_ref())
            .await
        {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| FrameworkSnippet {
                    framework_id: hit.document.metadata_str("framework_id").map(str::to_string),
                    category: hit.document.metadata_str("category").map(str::to_string),
                    framework_name: hit
                        .document
                        .metadata_str("framework_name")
                        .map(str::to_string),
                    text: hit.document.text,
                    score: hit.score,
                    created_at: hit.document.created_at,
                })
                .collect(),
            Err(e) => {
                log::warn!("Framework search failed: {e}");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for KnowledgeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeLibrary")
            .field("corpus", &self.corpus)
            .finish_non_exhaustive()
    }
}

fn metadata(entry: &KnowledgeFrameworkEntry) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("framework_id".into(), entry.id.into());
    metadata.insert("category".into(), entry.category.as_str().into());
    metadata.insert("framework_name".into(), entry.framework_name.clone().into());
    metadata
}
