//! LLM Gateway port
//!
//! Defines the single-shot chat-completion interface used for side calls
//! such as the critic model. The conversational agent goes through
//! [`AgentRuntime`](super::agent_runtime::AgentRuntime) instead.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }
}

/// Gateway for one-off chat completions
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Run one completion with a system prompt and a single user message,
    /// returning the assistant's full text.
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError>;
}
