//! JSON snapshot persistence for the corpus.
//!
//! A snapshot is the whole corpus in one pretty-printed file, tagged with a
//! format version so older files can be rejected instead of misread.

use folio_core::util::files::{read_json, write_json_atomic};
use folio_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::EmbeddedDocument;

/// Current snapshot format version.
pub const SNAPSHOT_FORMAT: u32 = 1;

/// Serializable image of a corpus store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    /// Snapshot format version.
    pub format: u32,

    /// Every stored document.
    pub documents: Vec<EmbeddedDocument>,
}

impl CorpusSnapshot {
    /// Wrap documents in a current-format snapshot.
    pub fn new(documents: Vec<EmbeddedDocument>) -> Self {
        Self {
            format: SNAPSHOT_FORMAT,
            documents,
        }
    }

    /// Load a snapshot; a missing file yields an empty snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        match read_json::<Self>(path).await? {
            Some(snapshot) if snapshot.format == SNAPSHOT_FORMAT => Ok(snapshot),
            Some(snapshot) => Err(Error::Serialization(format!(
                "{}: unsupported corpus snapshot format {}",
                path.display(),
                snapshot.format
            ))),
            None => Ok(Self::new(Vec::new())),
        }
    }

    /// Write the snapshot atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self).await
    }
}
