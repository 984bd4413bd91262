//! One-shot completion gateway (used by the critic model).

use super::client::OpenAiClient;
use super::protocol::{ChatMessage, ChatRequest};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vaultpilot_application::{CompletionGateway, GatewayError};

pub struct OpenAiCompletionGateway {
    client: OpenAiClient,
    max_tokens: Option<u32>,
    temperature: f32,
}

impl OpenAiCompletionGateway {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            max_tokens: None,
            temperature: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request(&self, model: &str, system_prompt: &str, prompt: &str) -> ChatRequest {
        ChatRequest::new(
            model,
            vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)],
        )
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature)
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompletionGateway {
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        let request = self.request(model, system_prompt, prompt);
        let completion = self.client.chat(&request, cancel).await?;
        completion
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::protocol::Role;
    use crate::testing::{StubServer, UNREACHABLE_URL, local_client};
    use serde_json::json;

    fn gateway() -> OpenAiCompletionGateway {
        let client = OpenAiClient::new(local_client(), UNREACHABLE_URL);
        OpenAiCompletionGateway::new(client).with_max_tokens(Some(512))
    }

    #[test]
    fn test_request_shape() {
        let request = gateway().request("critic-model", "be strict", "assess this");
        assert_eq!(request.model, "critic-model");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content.as_deref(), Some("assess this"));
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.tools.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let err = gateway()
            .complete("m", "s", "p", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionError(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_complete_returns_text() {
        let stub = StubServer::start(vec![json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"verdict\": \"approve\"}"}}]
        })])
        .await;
        let gateway = OpenAiCompletionGateway::new(OpenAiClient::new(local_client(), &stub.url));

        let text = gateway
            .complete("critic", "system", "prompt", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(text, r#"{"verdict": "approve"}"#);

        let request = &stub.requests()[0];
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][1]["content"], "prompt");
    }

    #[tokio::test]
    async fn test_empty_completion_is_invalid() {
        let stub = StubServer::start(vec![json!({
            "choices": [{"message": {"role": "assistant", "content": "  "}}]
        })])
        .await;
        let gateway = OpenAiCompletionGateway::new(OpenAiClient::new(local_client(), &stub.url));

        let err = gateway
            .complete("critic", "s", "p", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }
}
