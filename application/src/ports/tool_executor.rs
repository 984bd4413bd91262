//! Tool Executor port
//!
//! Defines how an agent runtime hands a tool call back to the pipeline.
//! The orchestrator always gives the runtime a gated executor, so whatever
//! the runtime calls goes through the safety gate first.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vaultpilot_domain::{ToolCall, ToolInvocationResult};

/// Port for tool execution
///
/// Executors never fail: every problem (unknown tool, transport error,
/// blocked call) is reported as an error outcome so the agent can react.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Execute a tool call
    async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolInvocationResult;
}
