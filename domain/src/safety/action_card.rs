//! Action card state machine.
//!
//! ```text
//! Pending ──> Confirmed ──> Completed
//!    │                 └──> Failed
//!    └──> Cancelled
//! ```
//!
//! A card only moves forward. `Completed` and `Failed` are reachable only
//! through `Confirmed`; `Cancelled`, `Completed` and `Failed` are terminal.

use super::assessment::RiskAssessment;
use super::operation::{PlannedOperation, describe_operations};
use super::pending::ReflectionKey;
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an action card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Confirmed => "confirmed",
            ActionStatus::Cancelled => "cancelled",
            ActionStatus::Completed => "completed",
            ActionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionStatus::Cancelled | ActionStatus::Completed | ActionStatus::Failed
        )
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-facing proposal for a destructive operation awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCard {
    /// Same value as the reflection key of the pending invocation
    pub id: ReflectionKey,
    pub title: String,
    pub status: ActionStatus,
    /// Name of the tool that will run on confirmation
    pub function_name: String,
    pub operations: Vec<PlannedOperation>,
    /// Critic opinion; `None` when the critic was unavailable and the
    /// tool is configured to proceed to confirmation anyway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Tool output or error message once executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ActionCard {
    /// Create a pending card for the given operations.
    pub fn pending(
        id: ReflectionKey,
        function_name: impl Into<String>,
        operations: Vec<PlannedOperation>,
        assessment: Option<RiskAssessment>,
    ) -> Self {
        let title = describe_operations(&operations)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            title,
            status: ActionStatus::Pending,
            function_name: function_name.into(),
            operations,
            assessment,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        }
    }

    /// Full description including every planned operation.
    pub fn description(&self) -> String {
        describe_operations(&self.operations)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the card reached a terminal state at least `age` before `now`.
    pub fn resolved_before(&self, now: DateTime<Utc>, age: std::time::Duration) -> bool {
        let Some(completed_at) = self.completed_at else {
            return false;
        };
        let age = chrono::Duration::from_std(age).unwrap_or(chrono::Duration::MAX);
        now.signed_duration_since(completed_at) >= age
    }

    pub fn resolved_for(&self, age: std::time::Duration) -> bool {
        self.resolved_before(Utc::now(), age)
    }

    fn transition(&mut self, from: ActionStatus, to: ActionStatus) -> Result<(), DomainError> {
        if self.status != from {
            return Err(DomainError::InvalidTransition {
                card: self.id.to_string(),
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        if to.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Pending -> Confirmed
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        self.transition(ActionStatus::Pending, ActionStatus::Confirmed)
    }

    /// Pending -> Cancelled
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(ActionStatus::Pending, ActionStatus::Cancelled)
    }

    /// Confirmed -> Completed
    pub fn complete(&mut self, output: impl Into<String>) -> Result<(), DomainError> {
        self.transition(ActionStatus::Confirmed, ActionStatus::Completed)?;
        self.result = Some(output.into());
        Ok(())
    }

    /// Confirmed -> Failed
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), DomainError> {
        self.transition(ActionStatus::Confirmed, ActionStatus::Failed)?;
        self.result = Some(error.into());
        Ok(())
    }
}
