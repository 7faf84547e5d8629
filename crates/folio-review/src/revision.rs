//! The feedback revision pipeline.
//!
//! Each article accumulates a numbered history of feedback entries. Plain
//! feedback is recorded as `reviewed`; feedback that drives a model
//! re-analysis is recorded as `revised`. Either may later be approved, which
//! promotes the final analysis into the retrievable corpus.
//!
//! ```text
//!  submit_feedback ──► reviewed ─┐
//!                                ├── approve ──► approved ──► analysis corpus
//!  request_revision ─► revised ──┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use folio_core::{Error, Result, is_blank};
use folio_llm::{CompletionRequest, LlmProvider};
use folio_vector::{Collection, Metadata, VectorCorpus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::records::{
    AnalysisFeedback, AnalysisPayload, ArticleIdentity, ArticleKey, FeedbackStatus,
};
use crate::store::FeedbackStore;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    /// Bound on one re-analysis, in seconds.
    pub timeout_secs: u64,
    /// Completion token cap for re-analysis.
    pub max_tokens: u32,
    /// Sampling temperature for re-analysis.
    pub temperature: f32,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_tokens: 2048,
            temperature: 0.4,
        }
    }
}

// ============================================================================
// Re-analysis
// ============================================================================

/// What the re-analysis agent is asked to revise.
#[derive(Debug, Clone, Copy)]
pub struct ReanalysisRequest<'a> {
    /// The analysis being critiqued.
    pub original: &'a AnalysisPayload,
    /// The editor's instruction.
    pub comment: &'a str,
    /// The editor's score, if any.
    pub score: Option<u8>,
}

/// A successful re-analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Reanalysis {
    /// The revised analysis.
    pub revision: AnalysisPayload,
    /// The instruction text actually sent.
    pub prompt: String,
}

/// Produces a revised analysis from an original and an editor's comment.
#[async_trait]
pub trait ReanalysisAgent: Send + Sync {
    /// Revise `request.original` according to `request.comment`.
    async fn reanalyze(&self, request: ReanalysisRequest<'_>) -> Result<Reanalysis>;
}

/// Re-analysis through a chat provider.
///
/// The provider is asked for a single JSON object; the first JSON object in
/// the reply is taken as the revised analysis.
pub struct LlmReanalyzer {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
    temperature: f32,
}

const REANALYSIS_SYSTEM_PROMPT: &str = "You are a senior news analyst. You revise structured \
article analyses according to editor feedback. Keep every field of the original analysis, \
change only what the feedback requires, and answer with a single JSON object.";

impl LlmReanalyzer {
    /// Re-analyzer over `provider`.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let defaults = RevisionConfig::default();
        Self {
            provider,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Apply token and temperature settings.
    pub fn with_config(mut self, config: &RevisionConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self
    }

    /// The user prompt sent for `request`.
    pub fn revision_prompt(request: &ReanalysisRequest<'_>) -> Result<String> {
        let original = serde_json::to_string_pretty(request.original)?;
        let mut prompt = format!(
            "Original analysis:\n{original}\n\nEditor feedback:\n{}\n",
            request.comment.trim()
        );
        if let Some(score) = request.score {
            prompt.push_str(&format!("\nEditor score for the original: {score}/10\n"));
        }
        prompt.push_str("\nReturn the revised analysis as one JSON object with the same fields.");
        Ok(prompt)
    }
}

#[async_trait]
impl ReanalysisAgent for LlmReanalyzer {
    async fn reanalyze(&self, request: ReanalysisRequest<'_>) -> Result<Reanalysis> {
        let prompt = Self::revision_prompt(&request)?;
        let completion = CompletionRequest::single_turn(REANALYSIS_SYSTEM_PROMPT, prompt.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_json_object();

        let response = self.provider.complete(completion).await?;
        let revision = extract_json_object(&response.content)
            .ok_or_else(|| Error::llm("re-analysis reply contained no JSON object"))?;
        Ok(Reanalysis { revision, prompt })
    }
}

/// The first JSON object embedded in `text`, if any.
///
/// Tolerates prose or code fences around the object.
pub fn extract_json_object(text: &str) -> Option<AnalysisPayload> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(fields))) => Some(AnalysisPayload::new(fields)),
            _ => None,
        }
    })
}

// ============================================================================
// Pipeline
// ============================================================================

/// An editor's feedback on one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackInput {
    /// The article.
    #[serde(flatten)]
    pub article: ArticleIdentity,
    /// The comment; must not be blank.
    pub comment: String,
    /// Optional score in 1..=10.
    #[serde(default)]
    pub score: Option<u8>,
    /// The analysis the comment refers to.
    pub analysis: AnalysisPayload,
}

impl FeedbackInput {
    /// Feedback on `analysis` for `article`.
    pub fn new(article: ArticleIdentity, comment: impl Into<String>, analysis: AnalysisPayload) -> Self {
        Self {
            article,
            comment: comment.into(),
            score: None,
            analysis,
        }
    }

    /// Attach a score.
    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    fn validate(&self) -> Result<ArticleKey> {
        let key = self.article.key()?;
        if is_blank(&self.comment) {
            return Err(Error::validation("comment must not be empty"));
        }
        if let Some(score) = self.score
            && !(1..=10).contains(&score)
        {
            return Err(Error::validation(format!("score must be between 1 and 10, got {score}")));
        }
        Ok(key)
    }
}

/// Result of an approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    /// The approved entry.
    pub feedback: AnalysisFeedback,
    /// Characters of the embedded analysis document; 0 when nothing usable
    /// was embedded.
    pub embedded_chars: usize,
    /// Whether an embedded analysis already existed for this entry.
    pub already_promoted: bool,
}

/// Feedback, re-analysis and approval for article analyses.
#[derive(Clone)]
pub struct FeedbackPipeline {
    store: Arc<dyn FeedbackStore>,
    corpus: Arc<VectorCorpus>,
    agent: Option<Arc<dyn ReanalysisAgent>>,
    timeout: Duration,
}

impl FeedbackPipeline {
    /// Pipeline without a re-analysis agent.
    pub fn new(store: Arc<dyn FeedbackStore>, corpus: Arc<VectorCorpus>) -> Self {
        Self {
            store,
            corpus,
            agent: None,
            timeout: Duration::from_secs(RevisionConfig::default().timeout_secs),
        }
    }

    /// Attach a re-analysis agent.
    pub fn with_agent(mut self, agent: Arc<dyn ReanalysisAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Bound each re-analysis.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether re-analysis is available.
    pub fn has_agent(&self) -> bool {
        self.agent.is_some()
    }

    /// Record plain feedback as the article's next `reviewed` entry.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a blank comment, a score outside 1..=10 or
    ///   a missing article identity
    /// - [`Error::ConcurrencyConflict`] if the revision number stays taken
    ///   after one retry
    pub async fn submit_feedback(&self, input: FeedbackInput) -> Result<AnalysisFeedback> {
        let key = input.validate()?;
        let entry = self
            .append(&key, |revision_number, parent_id| AnalysisFeedback {
                id: Uuid::new_v4(),
                article_id: input.article.article_id,
                article_url: input.article.article_url.clone(),
                revision_number,
                admin_comment: input.comment.clone(),
                score: input.score,
                gpt_analysis: input.analysis.clone(),
                gpt_revision: None,
                revision_prompt: None,
                status: FeedbackStatus::Reviewed,
                parent_id,
                created_at: Utc::now(),
            })
            .await?;

        log::info!("Recorded feedback #{} for article {key}", entry.revision_number);
        Ok(entry)
    }

    /// Re-analyze with the editor's comment and record a `revised` entry.
    ///
    /// Nothing is written when re-analysis fails.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] as for [`submit_feedback`](Self::submit_feedback)
    /// - [`Error::NotConfigured`] without a re-analysis agent
    /// - [`Error::RevisionFailed`] if re-analysis fails or times out
    /// - [`Error::ConcurrencyConflict`] as for [`submit_feedback`](Self::submit_feedback)
    pub async fn request_revision(&self, input: FeedbackInput) -> Result<AnalysisFeedback> {
        let key = input.validate()?;
        let agent = self
            .agent
            .as_ref()
            .ok_or_else(|| Error::not_configured("no re-analysis agent is configured"))?;

        let request = ReanalysisRequest {
            original: &input.analysis,
            comment: &input.comment,
            score: input.score,
        };
        let reanalysis = match tokio::time::timeout(self.timeout, agent.reanalyze(request)).await {
            Ok(Ok(reanalysis)) => reanalysis,
            Ok(Err(e)) => {
                log::warn!("Re-analysis for article {key} failed: {e}");
                return Err(Error::revision_failed(e.to_string()));
            }
            Err(_) => {
                log::warn!("Re-analysis for article {key} timed out");
                return Err(Error::revision_failed(format!(
                    "re-analysis timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let entry = self
            .append(&key, |revision_number, parent_id| AnalysisFeedback {
                id: Uuid::new_v4(),
                article_id: input.article.article_id,
                article_url: input.article.article_url.clone(),
                revision_number,
                admin_comment: input.comment.clone(),
                score: input.score,
                gpt_analysis: input.analysis.clone(),
                gpt_revision: Some(reanalysis.revision.clone()),
                revision_prompt: Some(reanalysis.prompt.clone()),
                status: FeedbackStatus::Revised,
                parent_id,
                created_at: Utc::now(),
            })
            .await?;

        log::info!("Recorded revision #{} for article {key}", entry.revision_number);
        Ok(entry)
    }

    /// Approve an entry and promote `final_analysis` into the corpus.
    ///
    /// The status write is durable before embedding starts; embedding is
    /// best-effort. The promoted document takes the entry's id, so an entry
    /// is promoted at most once even when approvals race.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `feedback_id` is unknown; the corpus is left
    /// unchanged.
    pub async fn approve(
        &self,
        feedback_id: Uuid,
        final_analysis: &AnalysisPayload,
    ) -> Result<ApprovalOutcome> {
        let feedback = self
            .store
            .set_feedback_status(feedback_id, FeedbackStatus::Approved)
            .await?;
        log::info!("Approved feedback {feedback_id}");

        if let Some(embedded_chars) = self.promoted_chars(feedback_id).await {
            log::debug!("Feedback {feedback_id} already promoted");
            return Ok(ApprovalOutcome {
                feedback,
                embedded_chars,
                already_promoted: true,
            });
        }

        let text = final_analysis.embedding_text();
        if text.is_empty() {
            log::warn!("Approved analysis for {feedback_id} has nothing to embed");
            return Ok(ApprovalOutcome {
                feedback,
                embedded_chars: 0,
                already_promoted: false,
            });
        }

        let inserted = self
            .corpus
            .insert_embedded(Collection::Analysis, feedback_id, text, promotion_metadata(&feedback))
            .await;
        let (embedded_chars, already_promoted) = match inserted {
            Ok(Some(doc)) => (doc.text.chars().count(), false),
            Ok(None) => (0, false),
            Err(e) if e.is_conflict() => {
                log::debug!("Feedback {feedback_id} was promoted concurrently");
                (self.promoted_chars(feedback_id).await.unwrap_or(0), true)
            }
            Err(e) => {
                log::warn!("Failed to promote analysis for {feedback_id}: {e}");
                (0, false)
            }
        };
        Ok(ApprovalOutcome {
            feedback,
            embedded_chars,
            already_promoted,
        })
    }

    /// Character count of the embedded analysis promoted for `feedback_id`.
    async fn promoted_chars(&self, feedback_id: Uuid) -> Option<usize> {
        match self.corpus.store().get(feedback_id).await {
            Ok(doc) => doc
                .filter(|d| d.collection == Collection::Analysis && d.has_vector())
                .map(|d| d.text.chars().count()),
            Err(e) => {
                log::warn!("Could not check prior promotion of {feedback_id}: {e}");
                None
            }
        }
    }

    /// An article's entries in revision order.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a missing article identity.
    pub async fn get_history(&self, article: &ArticleIdentity) -> Result<Vec<AnalysisFeedback>> {
        let key = article.key()?;
        let mut history = self.store.feedback_for_article(&key).await?;
        history.sort_by_key(|e| e.revision_number);
        Ok(history)
    }

    /// Read the latest entry, build the next one, insert it. A conflicting
    /// insert is retried once with freshly read numbering.
    async fn append<F>(&self, key: &ArticleKey, build: F) -> Result<AnalysisFeedback>
    where
        F: Fn(u32, Option<Uuid>) -> AnalysisFeedback + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let latest = self.store.latest_feedback(key).await?;
            let (revision_number, parent_id) = match &latest {
                Some(prev) => (prev.revision_number + 1, Some(prev.id)),
                None => (1, None),
            };
            let entry = build(revision_number, parent_id);

            match self.store.insert_feedback(entry.clone()).await {
                Ok(()) => return Ok(entry),
                Err(e) if e.is_conflict() && attempt == 0 => {
                    log::warn!("Revision #{revision_number} for article {key} was taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for FeedbackPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackPipeline")
            .field("corpus", &self.corpus)
            .field("has_agent", &self.agent.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn promotion_metadata(feedback: &AnalysisFeedback) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("feedback_id".into(), feedback.id.into());
    metadata.insert("approved".into(), true.into());
    metadata.insert("revision_number".into(), feedback.revision_number.into());
    if let Some(article_id) = feedback.article_id {
        metadata.insert("article_id".into(), article_id.into());
    }
    if let Some(url) = &feedback.article_url {
        metadata.insert("article_url".into(), url.clone().into());
    }
    metadata
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryReviewStore;
    use folio_llm::{FailingLlmProvider, MockLlmProvider};
    use folio_vector::{
        EmbeddingGateway, FailingEmbeddingProvider, MemoryCorpusStore, MockEmbeddingProvider,
    };
    use serde_json::json;

    fn payload(value: Value) -> AnalysisPayload {
        AnalysisPayload::from_value(value).unwrap()
    }

    fn corpus_with(gateway: EmbeddingGateway) -> Arc<VectorCorpus> {
        Arc::new(VectorCorpus::new(
            Arc::new(gateway),
            Arc::new(MemoryCorpusStore::new()),
        ))
    }

    fn pipeline() -> (FeedbackPipeline, Arc<VectorCorpus>) {
        let corpus = corpus_with(EmbeddingGateway::new(Arc::new(MockEmbeddingProvider::new(8))));
        (
            FeedbackPipeline::new(Arc::new(MemoryReviewStore::new()), corpus.clone()),
            corpus,
        )
    }

    fn input(comment: &str) -> FeedbackInput {
        FeedbackInput::new(ArticleIdentity::id(42), comment, payload(json!({"narration": "orig"})))
    }

    struct SlowAgent;

    #[async_trait]
    impl ReanalysisAgent for SlowAgent {
        async fn reanalyze(&self, _request: ReanalysisRequest<'_>) -> Result<Reanalysis> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Err(Error::operation("unreachable"))
        }
    }

    // ------------------------------------------------------------------------
    // JSON extraction
    // ------------------------------------------------------------------------

    #[test]
    fn test_extract_json_object() {
        let reply = "Sure! Here it is:\n```json\n{\"narration\": \"new {braces}\"}\n```";
        let extracted = extract_json_object(reply).unwrap();
        assert_eq!(extracted.narration(), Some("new {braces}"));

        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("[1, 2]").is_none());
        assert_eq!(
            extract_json_object("{broken {\"ok\": true}").unwrap().fields().get("ok"),
            Some(&json!(true))
        );
    }

    #[test]
    fn test_revision_prompt_contents() {
        let original = payload(json!({"narration": "orig"}));
        let prompt = LlmReanalyzer::revision_prompt(&ReanalysisRequest {
            original: &original,
            comment: " add realist lens ",
            score: Some(7),
        })
        .unwrap();
        assert!(prompt.contains("\"narration\": \"orig\""));
        assert!(prompt.contains("Editor feedback:\nadd realist lens\n"));
        assert!(prompt.contains("7/10"));
    }

    // ------------------------------------------------------------------------
    // Submit
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_submit_numbers_contiguously() {
        let (pipeline, _) = pipeline();
        let mut previous: Option<AnalysisFeedback> = None;
        for n in 1..=4 {
            let entry = pipeline.submit_feedback(input("improve tone")).await.unwrap();
            assert_eq!(entry.revision_number, n);
            assert_eq!(entry.status, FeedbackStatus::Reviewed);
            assert_eq!(entry.parent_id, previous.as_ref().map(|p| p.id));
            previous = Some(entry);
        }
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let (pipeline, _) = pipeline();

        let err = pipeline.submit_feedback(input("   ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        for bad in [0, 11] {
            let err = pipeline
                .submit_feedback(input("ok").with_score(bad))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("between 1 and 10"));
        }

        let anonymous = FeedbackInput::new(ArticleIdentity::default(), "ok", AnalysisPayload::default());
        assert!(matches!(
            pipeline.submit_feedback(anonymous).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert!(pipeline.get_history(&ArticleIdentity::id(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_articles_number_independently() {
        let (pipeline, _) = pipeline();
        pipeline.submit_feedback(input("a")).await.unwrap();
        let other = FeedbackInput::new(
            ArticleIdentity::url("https://example.com/x"),
            "b",
            AnalysisPayload::default(),
        );
        assert_eq!(pipeline.submit_feedback(other).await.unwrap().revision_number, 1);
    }

    // ------------------------------------------------------------------------
    // Revision
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_request_revision_records_prompt_and_output() {
        let (pipeline, _) = pipeline();
        let mock = MockLlmProvider::with_response(r#"{"narration": "realist take"}"#);
        let pipeline = pipeline.with_agent(Arc::new(LlmReanalyzer::new(Arc::new(mock.clone()))));

        let entry = pipeline
            .request_revision(input("add realist lens").with_score(7))
            .await
            .unwrap();

        assert_eq!(entry.status, FeedbackStatus::Revised);
        assert_eq!(entry.gpt_revision.as_ref().unwrap().narration(), Some("realist take"));
        assert_eq!(entry.gpt_analysis.narration(), Some("orig"));
        let sent = &mock.requests().await[0];
        assert!(sent.json_object);
        assert_eq!(entry.revision_prompt.as_deref(), Some(sent.messages[0].content.as_str()));
    }

    #[tokio::test]
    async fn test_request_revision_requires_agent() {
        let (pipeline, _) = pipeline();
        let err = pipeline.request_revision(input("x")).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_request_revision_failure_writes_nothing() {
        let (pipeline, _) = pipeline();
        let pipeline = pipeline.with_agent(Arc::new(LlmReanalyzer::new(Arc::new(
            FailingLlmProvider::permanent(),
        ))));

        let err = pipeline.request_revision(input("x")).await.unwrap_err();
        assert!(matches!(err, Error::RevisionFailed(_)));
        assert!(pipeline.get_history(&ArticleIdentity::id(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_revision_rejects_non_json_reply() {
        let (pipeline, _) = pipeline();
        let mock = MockLlmProvider::with_response("I cannot help with that.");
        let pipeline = pipeline.with_agent(Arc::new(LlmReanalyzer::new(Arc::new(mock))));

        let err = pipeline.request_revision(input("x")).await.unwrap_err();
        assert!(matches!(err, Error::RevisionFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_revision_times_out() {
        let (pipeline, _) = pipeline();
        let pipeline = pipeline
            .with_agent(Arc::new(SlowAgent))
            .with_timeout(Duration::from_secs(5));

        let err = pipeline.request_revision(input("x")).await.unwrap_err();
        assert!(err.to_string().contains("timed out after 5s"));
        assert!(pipeline.get_history(&ArticleIdentity::id(42)).await.unwrap().is_empty());
    }

    // ------------------------------------------------------------------------
    // Approval
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_approve_promotes_once() {
        let (pipeline, corpus) = pipeline();
        let entry = pipeline.submit_feedback(input("improve tone")).await.unwrap();
        let final_analysis = payload(json!({"content_summary": "S.", "narration": "N."}));

        let first = pipeline.approve(entry.id, &final_analysis).await.unwrap();
        assert_eq!(first.feedback.status, FeedbackStatus::Approved);
        assert_eq!(first.embedded_chars, "S.\n\nN.".chars().count());
        assert!(!first.already_promoted);

        let docs = corpus.store().documents(Collection::Analysis).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, entry.id);
        assert_eq!(docs[0].metadata.get("approved").and_then(|v| v.as_bool()), Some(true));

        let second = pipeline.approve(entry.id, &final_analysis).await.unwrap();
        assert!(second.already_promoted);
        assert_eq!(second.embedded_chars, first.embedded_chars);
        assert_eq!(corpus.count(Collection::Analysis).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_approve_unknown_is_not_found() {
        let (pipeline, corpus) = pipeline();
        let err = pipeline
            .approve(Uuid::new_v4(), &payload(json!({"narration": "N."})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(corpus.count(Collection::Analysis).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approve_empty_analysis_embeds_nothing() {
        let (pipeline, corpus) = pipeline();
        let entry = pipeline.submit_feedback(input("x")).await.unwrap();

        let outcome = pipeline.approve(entry.id, &payload(json!({"score": 3}))).await.unwrap();
        assert_eq!(outcome.embedded_chars, 0);
        assert_eq!(outcome.feedback.status, FeedbackStatus::Approved);
        assert_eq!(corpus.count(Collection::Analysis).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approve_survives_embedding_failure() {
        let corpus = corpus_with(EmbeddingGateway::new(Arc::new(FailingEmbeddingProvider::new(8))));
        let pipeline = FeedbackPipeline::new(Arc::new(MemoryReviewStore::new()), corpus.clone());
        let entry = pipeline.submit_feedback(input("x")).await.unwrap();

        let outcome = pipeline
            .approve(entry.id, &payload(json!({"narration": "N."})))
            .await
            .unwrap();
        assert_eq!(outcome.embedded_chars, 0);
        assert_eq!(outcome.feedback.status, FeedbackStatus::Approved);
        assert_eq!(corpus.count(Collection::Analysis).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_ascending() {
        let (pipeline, _) = pipeline();
        for c in ["a", "b", "c"] {
            pipeline.submit_feedback(input(c)).await.unwrap();
        }
        let history = pipeline.get_history(&ArticleIdentity::id(42)).await.unwrap();
        let numbers: Vec<_> = history.iter().map(|e| e.revision_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(history[2].admin_comment, "c");
    }
}
