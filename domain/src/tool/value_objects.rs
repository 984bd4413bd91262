//! Tool domain value objects - immutable outcome types
//!
//! A provider server answers every `CallTool` with a [`ToolOutcome`]
//! (`is_error` + textual content). The safety gate and the orchestrator wrap
//! it in a [`ToolInvocationResult`], which may additionally carry an
//! [`ActionCard`] when the call was intercepted instead of executed.

use crate::safety::action_card::ActionCard;
use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// Raw result of a `CallTool` round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the server reported a failure
    pub is_error: bool,
    /// Textual content returned by the server (or the error message)
    pub content: String,
}

impl ToolOutcome {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: content.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !self.is_error
    }
}

/// Result of handing a tool call to an executor.
///
/// When the safety gate defers a destructive call, `action_card` holds the
/// pending card and `outcome` tells the agent that confirmation is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// Name of the tool the result belongs to
    pub tool_name: String,
    /// Id of the call this result answers, when the runtime assigned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Outcome reported back to the agent
    pub outcome: ToolOutcome,
    /// Action card produced by interception, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_card: Option<ActionCard>,
}

impl ToolInvocationResult {
    pub fn new(tool_name: impl Into<String>, outcome: ToolOutcome) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: None,
            outcome,
            action_card: None,
        }
    }

    /// Result answering `call`, carrying over its name and id.
    pub fn for_call(call: &ToolCall, outcome: ToolOutcome) -> Self {
        Self {
            call_id: call.id.clone(),
            ..Self::new(call.name.clone(), outcome)
        }
    }

    pub fn with_action_card(mut self, card: ActionCard) -> Self {
        self.action_card = Some(card);
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
