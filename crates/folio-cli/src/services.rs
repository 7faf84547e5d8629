//! Service wiring for one CLI invocation.
//!
//! [`Services`] loads the corpus and review snapshots from the data
//! directory, builds the providers described by [`FolioConfig`], and saves
//! both snapshots back after a mutating command.

use folio_core::Result;
use folio_llm::{LlmProvider, OpenAiChatProvider, RetryWrapper};
use folio_review::{
    CritiqueChain, FeedbackPipeline, KnowledgeLibrary, LlmReanalyzer, MemoryReviewStore,
    RetrievalConfig, RetrievalEngine, ReviewSnapshot,
};
use folio_vector::{CorpusSnapshot, EmbeddingGateway, MemoryCorpusStore, VectorCorpus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::FolioConfig;

/// File name of the corpus snapshot inside the data directory.
pub const CORPUS_FILE: &str = "corpus.json";

/// File name of the review snapshot inside the data directory.
pub const REVIEW_FILE: &str = "review.json";

/// Every service a command may need, over one pair of snapshots.
pub struct Services {
    data_dir: PathBuf,
    corpus_store: Arc<MemoryCorpusStore>,
    review_store: Arc<MemoryReviewStore>,
    corpus: Arc<VectorCorpus>,
    chat_configured: bool,
    retrieval_config: RetrievalConfig,
    /// Critique version chains.
    pub critiques: CritiqueChain,
    /// Knowledge library.
    pub knowledge: KnowledgeLibrary,
    /// Context retrieval.
    pub retrieval: RetrievalEngine,
    /// Feedback revision pipeline.
    pub pipeline: FeedbackPipeline,
}

impl Services {
    /// Open the services described by `config`, using real providers.
    pub async fn open(config: &FolioConfig) -> Result<Self> {
        let gateway = Arc::new(EmbeddingGateway::from_config(&config.embedding));
        let chat = chat_provider(config)?;
        Self::assemble(config, config.data_dir()?, gateway, chat).await
    }

    /// Open over explicit providers and data directory.
    pub async fn assemble(
        config: &FolioConfig,
        data_dir: PathBuf,
        gateway: Arc<EmbeddingGateway>,
        chat: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self> {
        let corpus_snapshot = CorpusSnapshot::load(&data_dir.join(CORPUS_FILE)).await?;
        let review_snapshot = ReviewSnapshot::load(&data_dir.join(REVIEW_FILE)).await?;
        log::debug!(
            "Loaded {} corpus documents and {} critiques from {}",
            corpus_snapshot.documents.len(),
            review_snapshot.critiques.len(),
            data_dir.display()
        );

        let corpus_store = Arc::new(MemoryCorpusStore::from_snapshot(corpus_snapshot));
        let review_store = Arc::new(MemoryReviewStore::from_snapshot(review_snapshot));
        let corpus = Arc::new(VectorCorpus::new(gateway, corpus_store.clone()));

        let chat_configured = chat.is_some();
        let mut pipeline = FeedbackPipeline::new(review_store.clone(), corpus.clone())
            .with_timeout(Duration::from_secs(config.revision.timeout_secs));
        if let Some(provider) = chat {
            let agent = LlmReanalyzer::new(provider).with_config(&config.revision);
            pipeline = pipeline.with_agent(Arc::new(agent));
        }

        Ok(Self {
            critiques: CritiqueChain::new(review_store.clone(), corpus.clone()),
            knowledge: KnowledgeLibrary::new(review_store.clone(), corpus.clone()),
            retrieval: RetrievalEngine::new(corpus.clone(), chat_configured)
                .with_config(config.retrieval.clone()),
            pipeline,
            data_dir,
            corpus_store,
            review_store,
            corpus,
            chat_configured,
            retrieval_config: config.retrieval.clone(),
        })
    }

    /// Write both snapshots to the data directory, records first.
    ///
    /// Callers hold the data directory lock (see [`crate::lock`]) from
    /// [`Services::open`] through this call.
    pub async fn save(&self) -> Result<()> {
        self.review_store
            .snapshot()
            .await
            .save(&self.data_dir.join(REVIEW_FILE))
            .await?;
        self.corpus_store
            .snapshot()
            .await
            .save(&self.data_dir.join(CORPUS_FILE))
            .await?;
        log::debug!("Saved snapshots to {}", self.data_dir.display());
        Ok(())
    }

    /// The shared corpus.
    pub fn corpus(&self) -> &Arc<VectorCorpus> {
        &self.corpus
    }

    /// Directory holding the snapshots.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether a chat provider is available for re-analysis.
    pub fn chat_configured(&self) -> bool {
        self.chat_configured
    }

    /// Retrieval limits in use.
    pub fn retrieval_config(&self) -> &RetrievalConfig {
        &self.retrieval_config
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("data_dir", &self.data_dir)
            .field("corpus", &self.corpus)
            .field("chat_configured", &self.chat_configured)
            .finish_non_exhaustive()
    }
}

/// The retrying chat provider for `config`, if one is credentialed.
fn chat_provider(config: &FolioConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    let Some(provider) = OpenAiChatProvider::from_config(&config.llm)? else {
        log::info!("chat provider not configured; re-analysis is unavailable");
        return Ok(None);
    };
    let retrying: Arc<dyn LlmProvider> =
        Arc::new(RetryWrapper::new(Arc::new(provider)).with_max_attempts(config.llm.max_attempts));
    Ok(Some(retrying))
}

// ============================================================================
// Tests
// ============================================================================
