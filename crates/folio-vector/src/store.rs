//! Corpus storage backends.
//!
//! [`CorpusStore`] is the persistence seam for embedded documents. The store
//! is append-only: documents are never rewritten once put.

use async_trait::async_trait;
use folio_core::{Error, Result};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::persistence::CorpusSnapshot;
use crate::types::{Collection, EmbeddedDocument};

/// Persistence for embedded documents, partitioned by collection.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Append a document.
    ///
    /// # Errors
    ///
    /// [`Error::ConcurrencyConflict`] if a document with the same id exists.
    async fn put(&self, document: EmbeddedDocument) -> Result<()>;

    /// All documents in `collection`, in insertion order.
    async fn documents(&self, collection: Collection) -> Result<Vec<EmbeddedDocument>>;

    /// Look up a document by id.
    async fn get(&self, id: Uuid) -> Result<Option<EmbeddedDocument>>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory corpus store.
///
/// Serves tests directly and production through JSON snapshots
/// (see [`MemoryCorpusStore::snapshot`] and [`MemoryCorpusStore::from_snapshot`]).
#[derive(Debug, Default)]
pub struct MemoryCorpusStore {
    collections: RwLock<BTreeMap<Collection, Vec<EmbeddedDocument>>>,
}

impl MemoryCorpusStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: CorpusSnapshot) -> Self {
        let mut collections: BTreeMap<Collection, Vec<EmbeddedDocument>> = BTreeMap::new();
        for document in snapshot.documents {
            collections
                .entry(document.collection)
                .or_default()
                .push(document);
        }
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Capture every document, collection by collection.
    pub async fn snapshot(&self) -> CorpusSnapshot {
        let collections = self.collections.read().await;
        CorpusSnapshot::new(collections.values().flatten().cloned().collect())
    }
}

#[async_trait]
impl CorpusStore for MemoryCorpusStore {
    async fn put(&self, document: EmbeddedDocument) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections
            .values()
            .flatten()
            .any(|existing| existing.id == document.id)
        {
            return Err(Error::conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        collections
            .entry(document.collection)
            .or_default()
            .push(document);
        Ok(())
    }

    async fn documents(&self, collection: Collection) -> Result<Vec<EmbeddedDocument>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EmbeddedDocument>> {
        let collections = self.collections.read().await;
        Ok(collections.values().flatten().find(|d| d.id == id).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
