//! Risk assessor port for destructive tool calls.
//!
//! [`RiskAssessor`] abstracts the second opinion the safety gate asks for
//! before it proposes a destructive operation. The default implementation
//! is [`ModelCritic`](crate::use_cases::critic::ModelCritic), which asks a
//! separate chat model.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use vaultpilot_domain::RiskAssessment;

/// Why an assessment could not be produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssessmentError {
    #[error("Critic unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed critic response: {0}")]
    Malformed(String),

    #[error("Critic timed out")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,
}

impl AssessmentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AssessmentError::Cancelled)
    }
}

/// Port for assessing the risk of a proposed operation.
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    /// Assess a human-readable description of the planned operations.
    async fn assess(
        &self,
        operation_description: &str,
        cancel: &CancellationToken,
    ) -> Result<RiskAssessment, AssessmentError>;
}
