//! Chat agent runtime port
//!
//! The runtime owns the conversational model: it keeps per-thread history,
//! decides when to call tools and streams what it does as [`AgentUnit`]s.
//! Tool calls go back through the [`ToolExecutorPort`] handed over in the
//! [`AgentSpec`], which the orchestrator wraps with the safety gate.

use crate::ports::tool_executor::ToolExecutorPort;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vaultpilot_domain::{AgentUnit, ThreadHandle, ToolDescriptor};

/// Errors raised by the agent runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Agent creation failed: {0}")]
    CreationFailed(String),

    #[error("Unknown thread: {0}")]
    UnknownThread(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Timeout")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

/// Everything a runtime needs to build an agent for one turn.
#[derive(Clone)]
pub struct AgentSpec {
    pub instructions: String,
    pub tools: Vec<ToolDescriptor>,
    pub executor: Arc<dyn ToolExecutorPort>,
}

impl std::fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSpec")
            .field("instructions", &self.instructions)
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

/// Handle for receiving the units an agent emits during one turn.
///
/// Wraps an `mpsc::Receiver<AgentUnit>`. The channel closing means the
/// runtime finished normally; a failure is reported as [`AgentUnit::Error`].
pub struct AgentStream {
    pub receiver: mpsc::Receiver<AgentUnit>,
}

impl AgentStream {
    pub fn new(receiver: mpsc::Receiver<AgentUnit>) -> Self {
        Self { receiver }
    }

    pub async fn next(&mut self) -> Option<AgentUnit> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, AgentError> {
        let mut full_text = String::new();
        while let Some(unit) = self.receiver.recv().await {
            match unit {
                AgentUnit::Text(chunk) => full_text.push_str(&chunk),
                AgentUnit::Error(e) => return Err(AgentError::Upstream(e)),
                AgentUnit::ToolCallRequested(_) | AgentUnit::ToolResult(_) => {}
            }
        }
        Ok(full_text)
    }
}

/// Factory for agents bound to a tool set and an executor.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn create_agent(&self, spec: AgentSpec) -> Result<Box<dyn ChatAgent>, AgentError>;
}

/// An agent ready to run turns on threads.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Open a fresh runtime-side thread and return its opaque reference.
    async fn new_thread(&self, cancel: &CancellationToken) -> Result<String, AgentError>;

    /// Run a turn and stream what happens.
    async fn stream(
        &self,
        message: &str,
        thread: &ThreadHandle,
        cancel: &CancellationToken,
    ) -> Result<AgentStream, AgentError>;

    /// Run a turn and return only the final text.
    async fn send(
        &self,
        message: &str,
        thread: &ThreadHandle,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        self.stream(message, thread, cancel).await?.collect_text().await
    }
}
