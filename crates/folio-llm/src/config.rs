//! Chat provider configuration.

use serde::{Deserialize, Serialize};

/// Settings for the OpenAI-compatible chat provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API root, without the `/chat/completions` suffix.
    pub base_url: String,

    /// Bearer credential. Re-analysis is disabled without one.
    pub api_key: Option<String>,

    /// Model ID.
    pub model: String,

    /// Completion token cap.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-request HTTP timeout, in seconds.
    pub timeout_secs: u64,

    /// Attempts made by the retry wrapper for retryable failures.
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: 0.4,
            timeout_secs: 60,
            max_attempts: 3,
        }
    }
}

impl LlmConfig {
    /// Whether a non-blank credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}
