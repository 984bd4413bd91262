//! Async client for OpenAI-compatible chat completion APIs.

use super::protocol::{ChatMessage, ChatRequest, ChatResponse};
use crate::error::{HttpAdapterError, Result};
use crate::http;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// First choice of a completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Read the API key from `env_var`.
    pub fn with_api_key_from_env(self, env_var: &str) -> Result<Self> {
        match std::env::var(env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(self.with_api_key(key)),
            _ => Err(HttpAdapterError::MissingApiKey(env_var.to_string())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send a chat completion request and return the first choice.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "LLM request"
        );

        let mut builder = self.client.post(self.endpoint());
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response: ChatResponse = http::post_json(builder, request, cancel).await?;

        if let Some(error) = response.error {
            return Err(HttpAdapterError::UnexpectedResponse(format!(
                "API error: {}",
                error.message
            )));
        }
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HttpAdapterError::UnexpectedResponse("no choices".to_string()))?;
        debug!(
            chars = choice.message.content.as_ref().map_or(0, |s| s.len()),
            tool_calls = choice.message.tool_calls.as_ref().map_or(0, |t| t.len()),
            "LLM output"
        );
        Ok(Completion {
            message: choice.message,
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubServer, local_client};
    use serde_json::json;

    fn client() -> OpenAiClient {
        OpenAiClient::new(local_client(), "http://localhost:8080/v1/")
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(client().endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_missing_api_key_env() {
        let err = client()
            .with_api_key_from_env("VAULTPILOT_TEST_SURELY_UNSET_KEY")
            .unwrap_err();
        assert!(matches!(err, HttpAdapterError::MissingApiKey(var) if var == "VAULTPILOT_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", client().with_api_key("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let stub = StubServer::start(vec![json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1}
        })])
        .await;
        let client = OpenAiClient::new(local_client(), format!("{}/v1", stub.url)).with_api_key("k");

        let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("hi")]);
        let completion = client.chat(&request, &CancellationToken::new()).await.unwrap();
        assert_eq!(completion.message.content.as_deref(), Some("Hello"));
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(stub.requests()[0]["model"], "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let stub = StubServer::start(vec![json!({"error": {"message": "quota exceeded"}})]).await;
        let client = OpenAiClient::new(local_client(), &stub.url);

        let request = ChatRequest::new("m", vec![ChatMessage::user("hi")]);
        let err = client.chat(&request, &CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
