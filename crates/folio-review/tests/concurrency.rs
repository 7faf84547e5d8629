//! Concurrent writers against the stores' uniqueness constraints.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use folio_core::{Error, Result};
use folio_review::{
    AnalysisFeedback, AnalysisPayload, ArticleIdentity, ArticleKey, Critique, CritiqueChain,
    CritiqueInput, CritiqueStore, FeedbackInput, FeedbackPipeline, FeedbackStatus, FeedbackStore,
    MemoryReviewStore,
};
use folio_vector::{
    Collection, CorpusStore, EmbeddedDocument, EmbeddingGateway, MemoryCorpusStore,
    MockEmbeddingProvider, VectorCorpus,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;
use uuid::Uuid;

/// Holds the first `gated` readers of `latest_feedback` at a barrier so they
/// all observe the same latest entry.
struct RacingStore {
    inner: MemoryReviewStore,
    barrier: Barrier,
    gated: usize,
    reads: AtomicUsize,
}

impl RacingStore {
    fn new(gated: usize) -> Self {
        Self {
            inner: MemoryReviewStore::new(),
            barrier: Barrier::new(gated),
            gated,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FeedbackStore for RacingStore {
    async fn insert_feedback(&self, entry: AnalysisFeedback) -> Result<()> {
        self.inner.insert_feedback(entry).await
    }

    async fn get_feedback(&self, id: Uuid) -> Result<Option<AnalysisFeedback>> {
        self.inner.get_feedback(id).await
    }

    async fn latest_feedback(&self, key: &ArticleKey) -> Result<Option<AnalysisFeedback>> {
        let latest = self.inner.latest_feedback(key).await?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.gated {
            self.barrier.wait().await;
        }
        Ok(latest)
    }

    async fn feedback_for_article(&self, key: &ArticleKey) -> Result<Vec<AnalysisFeedback>> {
        self.inner.feedback_for_article(key).await
    }

    async fn set_feedback_status(&self, id: Uuid, status: FeedbackStatus) -> Result<AnalysisFeedback> {
        self.inner.set_feedback_status(id, status).await
    }
}

/// Reports no history and rejects every insert.
struct AlwaysTaken {
    inserts: AtomicUsize,
}

#[async_trait]
impl FeedbackStore for AlwaysTaken {
    async fn insert_feedback(&self, entry: AnalysisFeedback) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(Error::conflict(format!("revision {} taken", entry.revision_number)))
    }

    async fn get_feedback(&self, _id: Uuid) -> Result<Option<AnalysisFeedback>> {
        Ok(None)
    }

    async fn latest_feedback(&self, _key: &ArticleKey) -> Result<Option<AnalysisFeedback>> {
        Ok(None)
    }

    async fn feedback_for_article(&self, _key: &ArticleKey) -> Result<Vec<AnalysisFeedback>> {
        Ok(Vec::new())
    }

    async fn set_feedback_status(&self, id: Uuid, _status: FeedbackStatus) -> Result<AnalysisFeedback> {
        Err(Error::not_found(format!("feedback {id}")))
    }
}

/// Gated reads of the parent critique, so racing revisions see the same parent.
struct RacingCritiques {
    inner: MemoryReviewStore,
    barrier: Barrier,
    gated: usize,
    reads: AtomicUsize,
}

impl RacingCritiques {
    fn new(gated: usize) -> Self {
        Self {
            inner: MemoryReviewStore::new(),
            barrier: Barrier::new(gated),
            gated,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CritiqueStore for RacingCritiques {
    async fn insert_critique(&self, critique: Critique) -> Result<()> {
        self.inner.insert_critique(critique).await
    }

    async fn get_critique(&self, id: Uuid) -> Result<Option<Critique>> {
        let found = self.inner.get_critique(id).await?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.gated {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    async fn critiques_in_chain(&self, root_id: Uuid) -> Result<Vec<Critique>> {
        self.inner.critiques_in_chain(root_id).await
    }

    async fn critiques_for_article(&self, key: &ArticleKey) -> Result<Vec<Critique>> {
        self.inner.critiques_for_article(key).await
    }
}

/// Gated document lookups, so racing approvals both find no promotion.
struct RacingCorpus {
    inner: MemoryCorpusStore,
    barrier: Barrier,
    gated: usize,
    reads: AtomicUsize,
}

#[async_trait]
impl CorpusStore for RacingCorpus {
    async fn put(&self, document: EmbeddedDocument) -> Result<()> {
        self.inner.put(document).await
    }

    async fn documents(&self, collection: Collection) -> Result<Vec<EmbeddedDocument>> {
        self.inner.documents(collection).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<EmbeddedDocument>> {
        let found = self.inner.get(id).await?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.gated {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    fn name(&self) -> &str {
        "racing"
    }
}

fn corpus() -> Arc<VectorCorpus> {
    Arc::new(VectorCorpus::new(
        Arc::new(EmbeddingGateway::unconfigured(8)),
        Arc::new(MemoryCorpusStore::new()),
    ))
}

fn input(comment: &str) -> FeedbackInput {
    FeedbackInput::new(ArticleIdentity::id(42), comment, AnalysisPayload::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_first_submissions_get_distinct_numbers() {
    let store = Arc::new(RacingStore::new(2));
    let pipeline = Arc::new(FeedbackPipeline::new(store.clone(), corpus()));

    let handles: Vec<_> = ["first", "second"]
        .into_iter()
        .map(|comment| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.submit_feedback(input(comment)).await })
        })
        .collect();

    let mut numbers = BTreeSet::new();
    for result in futures::future::join_all(handles).await {
        let entry = result.unwrap().unwrap();
        numbers.insert(entry.revision_number);
    }
    assert_eq!(numbers, BTreeSet::from([1, 2]));

    let history = pipeline.get_history(&ArticleIdentity::id(42)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].parent_id, Some(history[0].id));
}

#[tokio::test]
async fn persistent_conflict_surfaces_after_one_retry() {
    let store = Arc::new(AlwaysTaken {
        inserts: AtomicUsize::new(0),
    });
    let pipeline = FeedbackPipeline::new(store.clone(), corpus());

    let err = pipeline.submit_feedback(input("x")).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(store.inserts.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_revisions_of_one_parent_keep_one() {
    let store = Arc::new(RacingCritiques::new(2));
    let chain = Arc::new(CritiqueChain::new(store.clone(), corpus()));
    let root = chain.create(CritiqueInput::new("v1").with_news_id(42)).await.unwrap();

    let handles: Vec<_> = ["v2a", "v2b"]
        .into_iter()
        .map(|text| {
            let chain = chain.clone();
            tokio::spawn(async move { chain.revise(root.id, CritiqueInput::new(text)).await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| r.as_ref().is_err_and(|e| e.is_conflict())));

    let versions = chain.list_versions(root.id).await.unwrap();
    let numbers: Vec<_> = versions.iter().map(|c| c.version).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(versions[1].parent_id, Some(root.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_approvals_promote_once() {
    let corpus_store = Arc::new(RacingCorpus {
        inner: MemoryCorpusStore::new(),
        barrier: Barrier::new(2),
        gated: 2,
        reads: AtomicUsize::new(0),
    });
    let corpus = Arc::new(VectorCorpus::new(
        Arc::new(EmbeddingGateway::new(Arc::new(MockEmbeddingProvider::new(8)))),
        corpus_store.clone(),
    ));
    let pipeline = Arc::new(FeedbackPipeline::new(Arc::new(MemoryReviewStore::new()), corpus.clone()));
    let entry = pipeline.submit_feedback(input("tighten")).await.unwrap();
    let final_analysis =
        AnalysisPayload::from_value(json!({"content_summary": "S.", "narration": "N."})).unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pipeline = pipeline.clone();
            let final_analysis = final_analysis.clone();
            tokio::spawn(async move { pipeline.approve(entry.id, &final_analysis).await })
        })
        .collect();

    let outcomes: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    assert_eq!(outcomes.iter().filter(|o| o.already_promoted).count(), 1);
    assert!(outcomes.iter().all(|o| o.embedded_chars == "S.\n\nN.".chars().count()));
    assert!(outcomes.iter().all(|o| o.feedback.status == FeedbackStatus::Approved));
    assert_eq!(corpus.count(Collection::Analysis).await.unwrap(), 1);
}
