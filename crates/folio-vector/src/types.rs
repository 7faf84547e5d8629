//! Common types for the embedding gateway and the vector corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Configuration
// ============================================================================

/// Embedding gateway configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// Bearer credential. Absent means "not configured".
    pub api_key: Option<String>,

    /// Embedding model name.
    pub model: String,

    /// Dimension every stored vector must have.
    pub dimension: usize,

    /// Inputs longer than this many characters are head-truncated.
    pub max_input_chars: usize,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            max_input_chars: 8000,
            timeout_ms: 15_000,
        }
    }
}

impl EmbeddingConfig {
    /// Whether a non-empty credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Named partition of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Editorial critiques.
    Critique,
    /// Approved analyses.
    Analysis,
    /// Knowledge-framework entries.
    Knowledge,
}

impl Collection {
    /// All collections, in a fixed order.
    pub const ALL: [Collection; 3] = [
        Collection::Critique,
        Collection::Analysis,
        Collection::Knowledge,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critique => "critique",
            Self::Analysis => "analysis",
            Self::Knowledge => "knowledge",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = folio_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critique" => Ok(Self::Critique),
            "analysis" => Ok(Self::Analysis),
            "knowledge" => Ok(Self::Knowledge),
            other => Err(folio_core::Error::validation(format!(
                "unknown collection '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// A scalar or array metadata value.
///
/// Serialized untagged, so `{"version": 2, "approved": true}` stays exactly
/// that on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Text(String),
    /// Ordered list.
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    /// The string payload, if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Integer` value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value.into_iter().map(Self::Text).collect())
    }
}

impl From<Uuid> for MetadataValue {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

/// Document metadata. Ordered so serialized output is stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Exact-match filter over metadata: every key must be present and equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Required key/value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub equals: BTreeMap<String, MetadataValue>,
}

impl MetadataFilter {
    /// Create an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    /// Whether `metadata` satisfies every condition.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.equals
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A stored corpus record: text, optional vector, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    /// Unique document identifier.
    pub id: Uuid,

    /// Partition this document lives in.
    pub collection: Collection,

    /// The text that was (or would have been) embedded.
    pub text: String,

    /// Embedding vector; absent when embedding failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    /// Weak references and tags (`critique_id`, `approved`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,

    /// Creation time, set once.
    pub created_at: DateTime<Utc>,
}

impl EmbeddedDocument {
    /// Create a vectorless document stamped with a fresh id and the current time.
    pub fn new(collection: Collection, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection,
            text: text.into(),
            vector: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Attach a vector.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Override the creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether a vector is attached.
    pub fn has_vector(&self) -> bool {
        self.vector.is_some()
    }

    /// The embedding dimension, or 0 when no vector is attached.
    pub fn dimension(&self) -> usize {
        self.vector.as_ref().map_or(0, Vec::len)
    }

    /// String metadata lookup.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// The matching document.
    pub document: EmbeddedDocument,

    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
}

// ============================================================================
// Tests
// ============================================================================
