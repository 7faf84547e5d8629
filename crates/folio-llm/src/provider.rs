//! Chat provider abstraction.
//!
//! Re-analysis only ever sends one instruction and one user turn and reads
//! back a single reply, so the request shape stays small: no streaming, no
//! tool calls.

use async_trait::async_trait;
use folio_core::Result;
use serde::{Deserialize, Serialize};

/// A chat completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation and return the whole reply.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Request
// ============================================================================

/// Tokens requested when the caller sets no limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A conversation to complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Instructions sent ahead of `messages` as a system turn.
    pub system_prompt: Option<String>,

    /// Conversation turns, oldest first.
    pub messages: Vec<Message>,

    /// Upper bound on generated tokens.
    pub max_tokens: u32,

    /// Sampling temperature; the provider default when absent.
    pub temperature: Option<f32>,

    /// Constrain the reply to one JSON object.
    pub json_object: bool,
}

impl CompletionRequest {
    /// Request over `messages` with provider-default sampling.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            system_prompt: None,
            messages,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            json_object: false,
        }
    }

    /// One user turn under `system_prompt`.
    pub fn single_turn(system_prompt: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(vec![Message::user(user)]).with_system_prompt(system_prompt)
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask for a JSON-object reply.
    pub fn with_json_object(mut self) -> Self {
        self.json_object = true;
        self
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who spoke.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl Message {
    /// A system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An earlier model reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Speaker of a turn, serialized as the chat API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions.
    System,
    /// The caller.
    User,
    /// The model.
    Assistant,
}

// ============================================================================
// Response
// ============================================================================

/// A completed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Reply text.
    pub content: String,
    /// Token accounting, zero when the provider reports none.
    pub usage: TokenUsage,
    /// Why generation ended.
    pub finish_reason: FinishReason,
}

/// Token accounting for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    /// Tokens in the request.
    pub prompt_tokens: u64,
    /// Tokens generated.
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Prompt plus completion tokens.
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Why the model stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FinishReason {
    /// Natural end of the reply.
    Stop,
    /// The token limit was reached; the reply may be cut short.
    Length,
    /// Withheld by the provider's content filter.
    ContentFilter,
}

impl FinishReason {
    /// Map the chat API's `finish_reason`; anything unrecognised counts as
    /// a natural stop.
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            Some("length") => Self::Length,
            Some("content_filter") => Self::ContentFilter,
            _ => Self::Stop,
        }
    }
}
