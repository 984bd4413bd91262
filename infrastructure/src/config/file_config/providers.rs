//! Model provider configuration from TOML (`[openai]` section)

use super::issue::{ConfigIssue, zero_timeout};
use crate::openai::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible API settings, shared by the agent and the critic.
///
/// ```toml
/// [openai]
/// base_url = "http://localhost:11434/v1"   # any compatible server
/// api_key_env = "OPENAI_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key.
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    pub api_key: Option<String>,
    pub base_url: String,
    /// Transport ceiling for one HTTP exchange.
    pub request_timeout_secs: u64,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 300,
        }
    }
}

impl FileOpenAiConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        zero_timeout("openai.request_timeout_secs", self.request_timeout_secs)
            .into_iter()
            .collect()
    }
}
