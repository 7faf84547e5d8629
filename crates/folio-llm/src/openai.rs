//! OpenAI-compatible chat completion provider.

use async_trait::async_trait;
use folio_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Message, TokenUsage,
};

/// Chat provider speaking `POST {base_url}/chat/completions`.
pub struct OpenAiChatProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatProvider {
    /// Creates a new provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer credential
    /// * `model` - Model ID (e.g., "gpt-4o-mini")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: LlmConfig::default().base_url,
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the provider at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bound every HTTP request.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the HTTP client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    /// Build from configuration; `None` when no credential is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone().filter(|_| config.is_configured()) else {
            return Ok(None);
        };
        Self::new(api_key, config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .map(Some)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(request.messages.iter().cloned());

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": messages,
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if request.json_object {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        body
    }
}

/// Rate limits and server errors may clear on their own.
fn status_is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl LlmProvider for OpenAiChatProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        tracing::debug!(model = %self.model, messages = request.messages.len(), "Chat completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await
            .map_err(|e| Error::llm_with_source("Failed to call chat completion API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("Chat completion API error {status}: {error_text}");
            return Err(if status_is_retryable(status) {
                Error::llm_retryable(message)
            } else {
                Error::llm(message)
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm_with_source("Failed to parse chat completion response", e))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::llm("Chat completion response contained no choices"))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| Error::llm("Missing content in chat completion response"))?;
        let usage = body.usage.unwrap_or_default();
        tracing::debug!(tokens = usage.total(), "Chat completion finished");
        Ok(CompletionResponse {
            content,
            usage,
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        })
    }

    fn name(&self) -> &str {
        "openai-chat"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_prepends_system_prompt() {
        let provider = OpenAiChatProvider::new("key", "gpt-4o-mini");
        let request = CompletionRequest::new(vec![Message::user("revise")])
            .with_system_prompt("You are an analyst")
            .with_temperature(0.2)
            .with_json_object();

        let body = provider.request_body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are an analyst");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAiChatProvider::new("key", "m").with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(OpenAiChatProvider::from_config(&LlmConfig::default()).unwrap().is_none());

        let config = LlmConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        assert!(OpenAiChatProvider::from_config(&config).unwrap().is_some());
    }

    #[test]
    fn test_status_is_retryable() {
        assert!(status_is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(status_is_retryable(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!status_is_retryable(reqwest::StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_usage() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"{}"}}]}"#).unwrap();
        assert!(body.usage.is_none());
        assert_eq!(body.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[tokio::test]
    #[ignore = "requires OPENAI_API_KEY and network access"]
    async fn test_live_completion() {
        let key = std::env::var("OPENAI_API_KEY").unwrap();
        let provider = OpenAiChatProvider::new(key, "gpt-4o-mini");
        let response = provider
            .complete(CompletionRequest::new(vec![Message::user("Reply with the word ok")]).with_max_tokens(5))
            .await
            .unwrap();
        assert!(!response.content.is_empty());
    }
}
