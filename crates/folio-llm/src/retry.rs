//! Retry wrapper for chat providers.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use folio_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Backoff schedule for [`RetryWrapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls, counting the first; at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each one.
    pub initial_delay: Duration,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        let retries = usize::try_from(self.max_attempts.max(1) - 1).unwrap_or(usize::MAX);
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(retries)
    }
}

/// A chat provider that retries transient failures of another.
///
/// Rate limits and server errors are retried on the [`RetryPolicy`]
/// schedule; anything else, and the last transient failure, is returned
/// unchanged.
pub struct RetryWrapper {
    inner: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
}

impl RetryWrapper {
    /// Wrap `provider` with the default policy.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            inner: provider,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the whole policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Total calls per completion, counting the first.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts.max(1);
        self
    }

    /// The policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl LlmProvider for RetryWrapper {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let provider = self.inner.clone();
        let attempt = || async { provider.complete(request.clone()).await };

        attempt
            .retry(self.policy.backoff())
            .when(Error::is_retryable)
            .notify(|err: &Error, delay: Duration| {
                tracing::warn!(
                    provider = provider.name(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Chat completion failed, retrying: {err}"
                );
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
