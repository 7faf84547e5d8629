//! Critique version chains.
//!
//! A chain starts with a version-1 root. Each revision links to its parent,
//! increments the version and inherits the root id, so the whole chain can be
//! listed from any member.

use chrono::Utc;
use folio_core::{Error, Result, is_blank};
use folio_vector::{Collection, Metadata, VectorCorpus};
use std::sync::Arc;
use uuid::Uuid;

use crate::records::{ArticleKey, Critique, CritiqueInput, DEFAULT_CRITIQUE_TYPE};
use crate::store::CritiqueStore;

/// Creates, revises and lists critique versions.
#[derive(Clone)]
pub struct CritiqueChain {
    store: Arc<dyn CritiqueStore>,
    corpus: Arc<VectorCorpus>,
}

impl CritiqueChain {
    /// Chain service over `store`, embedding into `corpus`.
    pub fn new(store: Arc<dyn CritiqueStore>, corpus: Arc<VectorCorpus>) -> Self {
        Self { store, corpus }
    }

    /// Create a version-1 critique.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for blank `critique_text`.
    pub async fn create(&self, input: CritiqueInput) -> Result<Critique> {
        validate(&input)?;
        let id = Uuid::new_v4();
        let critique = Critique {
            id,
            news_id: input.news_id,
            article_url: input.article_url,
            article_title: input.article_title,
            critique_text: input.critique_text,
            critique_type: critique_type(input.critique_type),
            editor_notes: input.editor_notes,
            version: 1,
            parent_id: None,
            root_id: id,
            created_at: Utc::now(),
        };

        self.store.insert_critique(critique.clone()).await?;
        log::info!("Created critique {} (chain {})", critique.id, critique.root_id);
        self.embed(&critique).await;
        Ok(critique)
    }

    /// Create the next version after `parent_id`.
    ///
    /// Article fields absent from `input` are copied from the parent.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for blank `critique_text`
    /// - [`Error::NotFound`] if the parent does not exist
    /// - [`Error::ConcurrencyConflict`] if the parent already has a successor
    ///   at the same version
    pub async fn revise(&self, parent_id: Uuid, input: CritiqueInput) -> Result<Critique> {
        validate(&input)?;
        let parent = self
            .store
            .get_critique(parent_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("critique {parent_id}")))?;

        let critique = Critique {
            id: Uuid::new_v4(),
            news_id: input.news_id.or(parent.news_id),
            article_url: input.article_url.or(parent.article_url),
            article_title: input.article_title.or(parent.article_title),
            critique_text: input.critique_text,
            critique_type: critique_type(input.critique_type),
            editor_notes: input.editor_notes,
            version: parent.version + 1,
            parent_id: Some(parent.id),
            root_id: parent.root_id,
            created_at: Utc::now(),
        };

        self.store.insert_critique(critique.clone()).await?;
        log::info!(
            "Revised critique {} -> {} (version {})",
            parent.id,
            critique.id,
            critique.version
        );
        self.embed(&critique).await;
        Ok(critique)
    }

    /// Every version of the chain containing `id`, ascending by version.
    ///
    /// Unknown ids yield an empty list.
    pub async fn list_versions(&self, id: Uuid) -> Result<Vec<Critique>> {
        let Some(member) = self.store.get_critique(id).await? else {
            return Ok(Vec::new());
        };
        let mut versions = self.store.critiques_in_chain(member.root_id).await?;
        versions.sort_by_key(|c| c.version);
        Ok(versions)
    }

    /// Every critique of an article, newest first.
    pub async fn list_for_article(&self, key: &ArticleKey) -> Result<Vec<Critique>> {
        let mut critiques = self.store.critiques_for_article(key).await?;
        critiques.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(critiques)
    }

    async fn embed(&self, critique: &Critique) {
        if let Err(e) = self
            .corpus
            .insert(Collection::Critique, critique.critique_text.clone(), metadata(critique))
            .await
        {
            log::warn!("Failed to index critique {}: {e}", critique.id);
        }
    }
}

impl std::fmt::Debug for CritiqueChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CritiqueChain")
            .field("corpus", &self.corpus)
            .finish_non_exhaustive()
    }
}

fn validate(input: &CritiqueInput) -> Result<()> {
    if is_blank(&input.critique_text) {
        return Err(Error::validation("critique_text must not be empty"));
    }
    Ok(())
}

fn critique_type(given: Option<String>) -> String {
    given
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_CRITIQUE_TYPE.to_string())
}

fn metadata(critique: &Critique) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("critique_id".into(), critique.id.into());
    metadata.insert("root_id".into(), critique.root_id.into());
    metadata.insert("version".into(), critique.version.into());
    metadata.insert("critique_type".into(), critique.critique_type.clone().into());
    if let Some(news_id) = critique.news_id {
        metadata.insert("news_id".into(), news_id.into());
    }
    if let Some(url) = &critique.article_url {
        metadata.insert("article_url".into(), url.clone().into());
    }
    metadata
}
