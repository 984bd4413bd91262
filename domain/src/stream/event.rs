//! Turn-level streaming events.
//!
//! Two tagged unions meet in the orchestrator:
//!
//! - [`AgentUnit`]: what the agent runtime emits while it works
//! - [`StreamEvent`]: what the caller of a turn receives
//!
//! Every turn ends with exactly one terminal [`StreamEvent`]
//! ([`Done`](StreamEvent::Done) or [`Error`](StreamEvent::Error)).

use crate::catalog::snapshot::ServerToolCount;
use crate::safety::action_card::ActionCard;
use crate::tool::entities::ToolCall;
use crate::tool::value_objects::{ToolInvocationResult, ToolOutcome};
use serde::{Deserialize, Serialize};

/// One unit of output from the agent runtime's streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentUnit {
    /// A text chunk from the model.
    Text(String),
    /// The model asked for a tool call (before the executor ran).
    ToolCallRequested(ToolCall),
    /// The executor answered a tool call.
    ToolResult(ToolInvocationResult),
    /// The runtime failed mid-stream; no further units follow.
    Error(String),
}

/// Context published at the start of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub conversation_id: String,
    pub thread_id: String,
    /// Tools offered to the agent for this turn
    pub tool_count: usize,
    /// Contribution of every configured server to the catalog
    pub servers: Vec<ServerToolCount>,
}

/// Payload of a `ToolResult` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

/// Payload of the terminal `Done` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub tool_calls: usize,
    /// Action cards left pending for the user to confirm or cancel
    pub pending_actions: Vec<String>,
}

/// Payload of the terminal `Error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFailure {
    pub message: String,
    #[serde(default)]
    pub cancelled: bool,
}

/// Event delivered to the caller of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum StreamEvent {
    Text(String),
    ToolCallRequested(ToolCall),
    ToolResult(ToolResultPayload),
    ActionCard(ActionCard),
    Metadata(TurnMetadata),
    Done(TurnSummary),
    Error(TurnFailure),
}

impl StreamEvent {
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error(TurnFailure {
            message: message.into(),
            cancelled: false,
        })
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        StreamEvent::Error(TurnFailure {
            message: message.into(),
            cancelled: true,
        })
    }

    /// Returns true if this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done(_) | StreamEvent::Error(_))
    }

    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Text(_) => "text",
            StreamEvent::ToolCallRequested(_) => "tool_call_requested",
            StreamEvent::ToolResult(_) => "tool_result",
            StreamEvent::ActionCard(_) => "action_card",
            StreamEvent::Metadata(_) => "metadata",
            StreamEvent::Done(_) => "done",
            StreamEvent::Error(_) => "error",
        }
    }
}
