//! Critic model: risk assessment through a secondary chat model.

use crate::ports::llm_gateway::{CompletionGateway, GatewayError};
use crate::ports::risk_assessor::{AssessmentError, RiskAssessor};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vaultpilot_domain::{CriticPromptTemplate, RiskAssessment, parse_assessment};

/// [`RiskAssessor`] backed by a chat-completion model.
///
/// Uses the fixed critic prompt and its own timeout, independent of the
/// conversational model's budget.
pub struct ModelCritic {
    gateway: Arc<dyn CompletionGateway>,
    model: String,
    timeout: Duration,
}

impl ModelCritic {
    pub fn new(gateway: Arc<dyn CompletionGateway>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            gateway,
            model: model.into(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl RiskAssessor for ModelCritic {
    async fn assess(
        &self,
        operation_description: &str,
        cancel: &CancellationToken,
    ) -> Result<RiskAssessment, AssessmentError> {
        let prompt = CriticPromptTemplate::assessment(operation_description);
        let request = self
            .gateway
            .complete(&self.model, CriticPromptTemplate::system(), &prompt, cancel);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AssessmentError::Cancelled),
            result = tokio::time::timeout(self.timeout, request) => match result {
                Ok(Ok(text)) => text,
                Ok(Err(GatewayError::Cancelled)) => return Err(AssessmentError::Cancelled),
                Ok(Err(GatewayError::Timeout)) => return Err(AssessmentError::Timeout),
                Ok(Err(e)) => {
                    warn!(model = %self.model, error = %e, "Critic request failed");
                    return Err(AssessmentError::Unavailable(e.to_string()));
                }
                Err(_) => {
                    warn!(model = %self.model, "Critic request timed out");
                    return Err(AssessmentError::Timeout);
                }
            },
        };

        let assessment = parse_assessment(&response).map_err(|e| {
            warn!(model = %self.model, error = %e, "Critic response could not be parsed");
            AssessmentError::Malformed(e.to_string())
        })?;
        debug!(verdict = assessment.verdict.as_str(), "Critic assessment received");
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vaultpilot_domain::Verdict;

    struct ScriptedGateway {
        response: Result<String, GatewayError>,
        hang: bool,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedGateway {
        fn answering(response: Result<String, GatewayError>) -> Self {
            Self {
                response,
                hang: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            model: &str,
            system_prompt: &str,
            prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, GatewayError> {
            self.seen.lock().unwrap().push((
                model.to_string(),
                system_prompt.to_string(),
                prompt.to_string(),
            ));
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn test_sends_fixed_prompt_and_parses_verdict() {
        let gateway = Arc::new(ScriptedGateway::answering(Ok(
            "```json\n{\"verdict\": \"caution\", \"reasoning\": \"irreversible\", \"warnings\": [\"no backup\"]}\n```"
                .to_string(),
        )));
        let critic = ModelCritic::new(gateway.clone(), "critic-mini", Duration::from_secs(5));

        let assessment = critic
            .assess("Delete `notes/todo.md`", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(assessment.verdict, Verdict::Caution);
        assert_eq!(assessment.warnings, vec!["no backup".to_string()]);

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen[0].0, "critic-mini");
        assert_eq!(seen[0].1, CriticPromptTemplate::system());
        assert_eq!(seen[0].2, CriticPromptTemplate::assessment("Delete `notes/todo.md`"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_failure() {
        let gateway = Arc::new(ScriptedGateway::answering(Ok("looks fine to me".to_string())));
        let critic = ModelCritic::new(gateway, "critic-mini", Duration::from_secs(5));

        let err = critic.assess("Delete x", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AssessmentError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_gateway_error_is_unavailable() {
        let gateway = Arc::new(ScriptedGateway::answering(Err(GatewayError::ConnectionError(
            "refused".into(),
        ))));
        let critic = ModelCritic::new(gateway, "critic-mini", Duration::from_secs(5));

        let err = critic.assess("Delete x", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AssessmentError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_independent_failure() {
        let mut gateway = ScriptedGateway::answering(Ok(String::new()));
        gateway.hang = true;
        let critic = ModelCritic::new(Arc::new(gateway), "critic-mini", Duration::from_millis(50));

        let err = critic.assess("Delete x", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, AssessmentError::Timeout);
    }

    #[tokio::test]
    async fn test_cancelled_before_answer() {
        let gateway = Arc::new(ScriptedGateway::answering(Ok(String::new())));
        let critic = ModelCritic::new(gateway, "critic-mini", Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = critic.assess("Delete x", &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
