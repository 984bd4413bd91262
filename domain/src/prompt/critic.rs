//! Prompt templates for the critic (risk assessment) model
//!
//! The wording is part of the safety contract: verdicts are only comparable
//! across runs if the critic always sees exactly the same instructions. Do
//! not reformat these strings.

/// Templates used when asking the critic model for a second opinion
pub struct CriticPromptTemplate;

impl CriticPromptTemplate {
    /// System prompt for the critic model
    pub fn system() -> &'static str {
        r#"You are a cautious safety reviewer for an assistant that manages a user's personal notes vault.
You never perform actions yourself. You only assess the risk of a single proposed operation before a human decides whether to run it.
Respond with a single JSON object and nothing else."#
    }

    /// User prompt describing the operation to assess
    pub fn assessment(operation_description: &str) -> String {
        format!(
            r#"The assistant wants to perform the following operation:

{}

Assess this operation. Consider:
1. Is the change reversible?
2. Could it destroy or overwrite user content?
3. Does the target look like what the user most likely meant?

Respond with JSON in exactly this shape:
{{"verdict": "approve" | "caution" | "reject", "reasoning": "<one or two sentences>", "warnings": ["<short warning>", ...]}}"#,
            operation_description
        )
    }
}
