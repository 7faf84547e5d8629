//! Folio review services.
//!
//! This crate holds the editorial side of Folio: versioned critiques, the
//! knowledge library, retrieval for prompt augmentation and the feedback
//! revision pipeline. Every service writes through a record store trait and
//! embeds into a shared [`folio_vector::VectorCorpus`].
//!
//! # Modules
//!
//! - [`records`]: Critique, feedback and framework records
//! - [`store`]: Record store traits and the in-memory store
//! - [`critique`]: Critique version chains
//! - [`knowledge`]: Knowledge library
//! - [`retrieval`]: Context retrieval
//! - [`prompt`]: Prompt augmentation
//! - [`revision`]: Feedback revision pipeline

pub mod critique;
pub mod knowledge;
pub mod prompt;
pub mod records;
pub mod retrieval;
pub mod revision;
pub mod store;

pub use critique::CritiqueChain;
pub use knowledge::{FrameworkAdded, FrameworkSnippet, KnowledgeLibrary};
pub use prompt::{append_framework_context, build_augmented_prompt, build_augmented_prompt_with_limit};
pub use records::{
    AnalysisFeedback, AnalysisPayload, ArticleIdentity, ArticleKey, Critique, CritiqueInput,
    EditorNotes, FeedbackStatus, FrameworkCategory, FrameworkInput, KnowledgeFrameworkEntry,
};
pub use retrieval::{ContextSnippet, RetrievalConfig, RetrievalEngine, RetrievedContext};
pub use revision::{
    ApprovalOutcome, FeedbackInput, FeedbackPipeline, LlmReanalyzer, Reanalysis, ReanalysisAgent,
    ReanalysisRequest, RevisionConfig, extract_json_object,
};
pub use store::{CritiqueStore, FeedbackStore, KnowledgeStore, MemoryReviewStore, ReviewSnapshot};
