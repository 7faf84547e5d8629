//! Chat completion providers for Folio.
//!
//! The re-analysis step of the feedback pipeline is the only consumer. It
//! talks to an [`LlmProvider`], which is either the OpenAI-compatible HTTP
//! client, a mock, or either of those behind a [`RetryWrapper`].

mod config;
mod mock;
mod openai;
mod provider;
mod retry;

pub use config::LlmConfig;
pub use mock::{FailingLlmProvider, MockLlmProvider};
pub use openai::OpenAiChatProvider;
pub use provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Message, Role, TokenUsage,
};
pub use retry::{RetryPolicy, RetryWrapper};
