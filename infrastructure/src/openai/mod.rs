//! OpenAI-compatible chat completion adapters.
//!
//! - [`OpenAiCompletionGateway`]: one-shot completions for the critic model
//! - [`OpenAiAgentRuntime`]: the conversational agent with a tool loop

pub mod client;
pub mod gateway;
pub mod protocol;
pub mod runtime;

pub use client::{DEFAULT_BASE_URL, OpenAiClient};
pub use gateway::OpenAiCompletionGateway;
pub use runtime::{DEFAULT_MAX_TOOL_ROUNDS, OpenAiAgentRuntime};
