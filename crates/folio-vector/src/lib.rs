//! Embedding gateway and vector corpus store for Folio.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      folio-vector                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  ├── MockEmbeddingProvider (deterministic, tests)           │
//! │  ├── FailingEmbeddingProvider (always errors, tests)        │
//! │  └── OpenAiEmbeddingProvider (remote /embeddings)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingGateway (validate, truncate, timeout, dimension)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CorpusStore trait                                          │
//! │  └── MemoryCorpusStore (+ JSON snapshot persistence)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorCorpus (insert-with-embedding, exact cosine search)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_vector::{Collection, EmbeddingGateway, MemoryCorpusStore, Metadata,
//!     MockEmbeddingProvider, VectorCorpus};
//! use std::sync::Arc;
//!
//! let gateway = EmbeddingGateway::new(Arc::new(MockEmbeddingProvider::new(8)));
//! let corpus = VectorCorpus::new(Arc::new(gateway), Arc::new(MemoryCorpusStore::new()));
//!
//! corpus.insert(Collection::Critique, "tone is too alarmist", Metadata::new()).await?;
//! let query = corpus.gateway().embed("alarmist tone").await?;
//! let hits = corpus.search(Collection::Critique, &query, 5, None).await?;
//! ```

pub mod corpus;
pub mod embedding;
pub mod gateway;
pub mod openai;
pub mod persistence;
pub mod similarity;
pub mod store;
pub mod types;

// Re-exports: core types
pub use types::{
    Collection, EmbeddedDocument, EmbeddingConfig, Metadata, MetadataFilter, MetadataValue,
    ScoredDocument,
};

// Re-exports: providers and gateway
pub use embedding::{EmbedResult, EmbeddingProvider, FailingEmbeddingProvider, MockEmbeddingProvider};
pub use gateway::EmbeddingGateway;
pub use openai::OpenAiEmbeddingProvider;

// Re-exports: storage and search
pub use corpus::VectorCorpus;
pub use persistence::CorpusSnapshot;
pub use similarity::cosine_similarity;
pub use store::{CorpusStore, MemoryCorpusStore};
