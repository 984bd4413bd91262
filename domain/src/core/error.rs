//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    #[error("Invalid reflection key: {0}")]
    InvalidReflectionKey(String),

    #[error("Invalid state transition for action card {card}: {from} -> {to}")]
    InvalidTransition {
        card: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Malformed risk assessment: {0}")]
    MalformedAssessment(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
