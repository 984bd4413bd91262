//! Type definitions for the RunTurn use case.

use crate::ports::agent_runtime::AgentError;
use crate::ports::thread_store::ThreadStoreError;
use crate::use_cases::tool_catalog::CatalogError;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use vaultpilot_domain::StreamEvent;

/// Errors that end a turn with a terminal `Error` event
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Thread store error: {0}")]
    ThreadStore(#[from] ThreadStoreError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Completion timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Turn cancelled")]
    Cancelled,

    #[error("Event receiver dropped")]
    Disconnected,
}

impl TurnError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            TurnError::Cancelled | TurnError::Disconnected => true,
            TurnError::Agent(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

impl From<CatalogError> for TurnError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Cancelled => TurnError::Cancelled,
        }
    }
}

/// Input for the RunTurn use case
#[derive(Debug, Clone)]
pub struct RunTurnInput {
    /// Conversation the turn belongs to; also the thread id
    pub conversation_id: String,
    /// The user's message
    pub message: String,
}

impl RunTurnInput {
    pub fn new(conversation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message: message.into(),
        }
    }
}

/// Ordered events of one turn, ending with exactly one `Done` or `Error`.
pub struct TurnStream {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl TurnStream {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream into a vector (terminal event last).
    pub async fn collect(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }
}
