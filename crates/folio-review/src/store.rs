//! Record storage traits and the in-memory implementation.
//!
//! The stores own the uniqueness rules that keep version numbering sound
//! under concurrent writers:
//!
//! - critiques are unique on `(root_id, version)`
//! - feedback is unique on `(article key, revision_number)`
//!
//! A violating insert fails with [`Error::ConcurrencyConflict`] and writes
//! nothing.

use async_trait::async_trait;
use folio_core::util::files::{read_json, write_json_atomic};
use folio_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::records::{
    AnalysisFeedback, ArticleKey, Critique, FeedbackStatus, FrameworkCategory,
    KnowledgeFrameworkEntry,
};

/// Current review snapshot format version.
pub const SNAPSHOT_FORMAT: u32 = 1;

// ============================================================================
// Traits
// ============================================================================

/// Persistence for critique versions.
#[async_trait]
pub trait CritiqueStore: Send + Sync {
    /// Insert a new version. Conflicts on a taken `(root_id, version)`.
    async fn insert_critique(&self, critique: Critique) -> Result<()>;

    /// Look up a critique by id.
    async fn get_critique(&self, id: Uuid) -> Result<Option<Critique>>;

    /// Every version sharing `root_id`, in any order.
    async fn critiques_in_chain(&self, root_id: Uuid) -> Result<Vec<Critique>>;

    /// Every critique concerning `key`, in any order.
    async fn critiques_for_article(&self, key: &ArticleKey) -> Result<Vec<Critique>>;
}

/// Persistence for feedback entries.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Insert a new entry. Conflicts on a taken `(article key, revision_number)`.
    async fn insert_feedback(&self, entry: AnalysisFeedback) -> Result<()>;

    /// Look up an entry by id.
    async fn get_feedback(&self, id: Uuid) -> Result<Option<AnalysisFeedback>>;

    /// The entry with the highest revision number for `key`.
    async fn latest_feedback(&self, key: &ArticleKey) -> Result<Option<AnalysisFeedback>>;

    /// Every entry for `key`, in any order.
    async fn feedback_for_article(&self, key: &ArticleKey) -> Result<Vec<AnalysisFeedback>>;

    /// Overwrite the status of an entry and return the updated entry.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is unknown.
    async fn set_feedback_status(&self, id: Uuid, status: FeedbackStatus) -> Result<AnalysisFeedback>;
}

/// Persistence for knowledge frameworks.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert an entry.
    async fn insert_framework(&self, entry: KnowledgeFrameworkEntry) -> Result<()>;

    /// Look up an entry by id.
    async fn get_framework(&self, id: Uuid) -> Result<Option<KnowledgeFrameworkEntry>>;

    /// Every entry, optionally restricted to one category, in any order.
    async fn list_frameworks(
        &self,
        category: Option<&FrameworkCategory>,
    ) -> Result<Vec<KnowledgeFrameworkEntry>>;

    /// Remove an entry.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is unknown.
    async fn delete_framework(&self, id: Uuid) -> Result<()>;
}

// ============================================================================
// Snapshot
// ============================================================================

/// Serializable image of every review record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    /// Snapshot format version.
    pub format: u32,
    /// Every critique version.
    #[serde(default)]
    pub critiques: Vec<Critique>,
    /// Every feedback entry.
    #[serde(default)]
    pub feedback: Vec<AnalysisFeedback>,
    /// Every knowledge framework.
    #[serde(default)]
    pub frameworks: Vec<KnowledgeFrameworkEntry>,
}

impl Default for ReviewSnapshot {
    fn default() -> Self {
        Self {
            format: SNAPSHOT_FORMAT,
            critiques: Vec::new(),
            feedback: Vec::new(),
            frameworks: Vec::new(),
        }
    }
}

impl ReviewSnapshot {
    /// Load a snapshot; a missing file yields an empty snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        match read_json::<Self>(path).await? {
            Some(snapshot) if snapshot.format == SNAPSHOT_FORMAT => Ok(snapshot),
            Some(snapshot) => Err(Error::Serialization(format!(
                "{}: unsupported review snapshot format {}",
                path.display(),
                snapshot.format
            ))),
            None => Ok(Self::default()),
        }
    }

    /// Write the snapshot atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self).await
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory implementation of all three record stores.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    state: RwLock<ReviewSnapshot>,
}

impl MemoryReviewStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: ReviewSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Capture every record.
    pub async fn snapshot(&self) -> ReviewSnapshot {
        self.state.read().await.clone()
    }
}

fn same_article(entry: &AnalysisFeedback, key: &ArticleKey) -> bool {
    entry.article_key().is_ok_and(|k| &k == key)
}

#[async_trait]
impl CritiqueStore for MemoryReviewStore {
    async fn insert_critique(&self, critique: Critique) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .critiques
            .iter()
            .any(|c| c.id == critique.id || (c.root_id == critique.root_id && c.version == critique.version))
        {
            return Err(Error::conflict(format!(
                "critique chain {} already has version {}",
                critique.root_id, critique.version
            )));
        }
        state.critiques.push(critique);
        Ok(())
    }

    async fn get_critique(&self, id: Uuid) -> Result<Option<Critique>> {
        let state = self.state.read().await;
        Ok(state.critiques.iter().find(|c| c.id == id).cloned())
    }

    async fn critiques_in_chain(&self, root_id: Uuid) -> Result<Vec<Critique>> {
        let state = self.state.read().await;
        Ok(state
            .critiques
            .iter()
            .filter(|c| c.root_id == root_id)
            .cloned()
            .collect())
    }

    async fn critiques_for_article(&self, key: &ArticleKey) -> Result<Vec<Critique>> {
        let state = self.state.read().await;
        Ok(state
            .critiques
            .iter()
            .filter(|c| c.concerns(key))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FeedbackStore for MemoryReviewStore {
    async fn insert_feedback(&self, entry: AnalysisFeedback) -> Result<()> {
        let key = entry.article_key()?;
        let mut state = self.state.write().await;
        if state.feedback.iter().any(|e| {
            e.id == entry.id || (e.revision_number == entry.revision_number && same_article(e, &key))
        }) {
            return Err(Error::conflict(format!(
                "article {key} already has revision {}",
                entry.revision_number
            )));
        }
        state.feedback.push(entry);
        Ok(())
    }

    async fn get_feedback(&self, id: Uuid) -> Result<Option<AnalysisFeedback>> {
        let state = self.state.read().await;
        Ok(state.feedback.iter().find(|e| e.id == id).cloned())
    }

    async fn latest_feedback(&self, key: &ArticleKey) -> Result<Option<AnalysisFeedback>> {
        let state = self.state.read().await;
        Ok(state
            .feedback
            .iter()
            .filter(|e| same_article(e, key))
            .max_by_key(|e| e.revision_number)
            .cloned())
    }

    async fn feedback_for_article(&self, key: &ArticleKey) -> Result<Vec<AnalysisFeedback>> {
        let state = self.state.read().await;
        Ok(state
            .feedback
            .iter()
            .filter(|e| same_article(e, key))
            .cloned()
            .collect())
    }

    async fn set_feedback_status(&self, id: Uuid, status: FeedbackStatus) -> Result<AnalysisFeedback> {
        let mut state = self.state.write().await;
        let entry = state
            .feedback
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::not_found(format!("feedback {id}")))?;
        entry.status = status;
        Ok(entry.clone())
    }
}

#[async_trait]
impl KnowledgeStore for MemoryReviewStore {
    async fn insert_framework(&self, entry: KnowledgeFrameworkEntry) -> Result<()> {
        let mut state = self.state.write().await;
        if state.frameworks.iter().any(|f| f.id == entry.id) {
            return Err(Error::conflict(format!("framework {} already exists", entry.id)));
        }
        state.frameworks.push(entry);
        Ok(())
    }

    async fn get_framework(&self, id: Uuid) -> Result<Option<KnowledgeFrameworkEntry>> {
        let state = self.state.read().await;
        Ok(state.frameworks.iter().find(|f| f.id == id).cloned())
    }

    async fn list_frameworks(
        &self,
        category: Option<&FrameworkCategory>,
    ) -> Result<Vec<KnowledgeFrameworkEntry>> {
        let state = self.state.read().await;
        Ok(state
            .frameworks
            .iter()
            .filter(|f| category.is_none_or(|c| &f.category == c))
            .cloned()
            .collect())
    }

    async fn delete_framework(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.frameworks.len();
        state.frameworks.retain(|f| f.id != id);
        if state.frameworks.len() == before {
            return Err(Error::not_found(format!("framework {id}")));
        }
        Ok(())
    }
}
