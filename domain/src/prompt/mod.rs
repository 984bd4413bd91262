//! Prompt domain
//!
//! Fixed prompt templates. Only the critic prompt lives here; the primary
//! agent's instructions come from configuration.

mod critic;

pub use critic::CriticPromptTemplate;
