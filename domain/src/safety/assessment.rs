//! Critic risk assessments.
//!
//! The critic model answers with a JSON object. [`parse_assessment`] pulls it
//! out of the raw response, tolerating code fences and surrounding prose.
//! Anything that does not yield a verdict is a malformed assessment, which
//! the safety gate treats exactly like an unreachable critic.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Critic's overall opinion of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    #[serde(alias = "approved", alias = "safe")]
    Approve,
    #[serde(alias = "warn", alias = "warning")]
    Caution,
    #[serde(alias = "rejected", alias = "block", alias = "unsafe")]
    Reject,
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Approve => "approve",
            Verdict::Caution => "caution",
            Verdict::Reject => "reject",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Second-opinion risk assessment attached to an action card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub verdict: Verdict,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RiskAssessment {
    pub fn new(verdict: Verdict, reasoning: impl Into<String>) -> Self {
        Self {
            verdict,
            reasoning: reasoning.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Extract a [`RiskAssessment`] from a raw critic response.
///
/// # Examples
///
/// ```
/// use vaultpilot_domain::safety::assessment::{parse_assessment, Verdict};
///
/// let raw = "```json\n{\"verdict\": \"caution\", \"reasoning\": \"Irreversible\"}\n```";
/// let assessment = parse_assessment(raw).unwrap();
/// assert_eq!(assessment.verdict, Verdict::Caution);
/// assert!(assessment.warnings.is_empty());
/// ```
pub fn parse_assessment(response: &str) -> Result<RiskAssessment, DomainError> {
    let start = response
        .find('{')
        .ok_or_else(|| DomainError::MalformedAssessment("no JSON object in response".into()))?;
    let end = response
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| DomainError::MalformedAssessment("unterminated JSON object".into()))?;

    let mut assessment: RiskAssessment = serde_json::from_str(&response[start..=end])
        .map_err(|e| DomainError::MalformedAssessment(e.to_string()))?;

    assessment.reasoning = assessment.reasoning.trim().to_string();
    assessment.warnings.retain(|w| !w.trim().is_empty());
    Ok(assessment)
}
