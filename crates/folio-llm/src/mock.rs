//! Mock chat providers for testing.

use async_trait::async_trait;
use folio_core::{Error, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider, TokenUsage};

/// Mock provider that returns canned responses.
///
/// Responses are returned in order and cycle once exhausted. Every request
/// is recorded so tests can inspect the prompt that was sent.
#[derive(Clone)]
pub struct MockLlmProvider {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    canned: Vec<String>,
    index: usize,
    requests: Vec<CompletionRequest>,
}

impl MockLlmProvider {
    /// Creates a mock provider with canned responses.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_llm::MockLlmProvider;
    ///
    /// let provider = MockLlmProvider::new(vec![
    ///     r#"{"narration": "first"}"#.to_string(),
    ///     r#"{"narration": "second"}"#.to_string(),
    /// ]);
    /// ```
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                canned: responses,
                index: 0,
                requests: Vec::new(),
            })),
        }
    }

    /// Creates a mock provider with a single response.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Requests received so far (shared across clones).
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.state.lock().await.requests.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut state = self.state.lock().await;
        state.requests.push(request);

        let content = state
            .canned
            .get(state.index)
            .cloned()
            .ok_or_else(|| Error::llm("mock provider has no canned responses"))?;
        state.index = (state.index + 1) % state.canned.len();

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
            },
            finish_reason: FinishReason::Stop,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock provider that fails every call, optionally succeeding after a
/// number of retryable failures.
#[derive(Clone)]
pub struct FailingLlmProvider {
    retryable: bool,
    failures_before_success: Option<usize>,
    calls: Arc<Mutex<usize>>,
}

impl FailingLlmProvider {
    /// Always fails with a non-retryable error.
    pub fn permanent() -> Self {
        Self {
            retryable: false,
            failures_before_success: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Always fails with a retryable error.
    pub fn transient() -> Self {
        Self {
            retryable: true,
            ..Self::permanent()
        }
    }

    /// Fails `failures` times with retryable errors, then answers `"{}"`.
    pub fn recovering_after(failures: usize) -> Self {
        Self {
            retryable: true,
            failures_before_success: Some(failures),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of calls received (shared across clones).
    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }
}

#[async_trait]
impl LlmProvider for FailingLlmProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        let mut calls = self.calls.lock().await;
        *calls += 1;

        if self.failures_before_success.is_some_and(|n| *calls > n) {
            return Ok(CompletionResponse {
                content: "{}".to_string(),
                usage: TokenUsage::default(),
                finish_reason: FinishReason::Stop,
            });
        }
        if self.retryable {
            Err(Error::llm_retryable("stubbed transient failure"))
        } else {
            Err(Error::llm("stubbed failure"))
        }
    }

    fn name(&self) -> &str {
        "failing"
    }
}
