//! Safety configuration from TOML (`[critic]` and `[safety]` sections)

use super::issue::{ConfigIssue, ConfigValidationError, empty_model, zero_timeout};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vaultpilot_application::SafetyParams;
use vaultpilot_domain::tool::tool_key;

/// Critic model settings
///
/// ```toml
/// [critic]
/// model = "gpt-4o-mini"
/// timeout_secs = 30
/// fail_open_tools = ["rename_note"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCriticConfig {
    pub model: String,
    pub timeout_secs: u64,
    /// Destructive tools that still reach confirmation (unassessed) when
    /// the critic is unavailable. Everything else fails closed.
    pub fail_open_tools: Vec<String>,
}

impl Default for FileCriticConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
            fail_open_tools: Vec::new(),
        }
    }
}

/// Destructive-operation settings
///
/// ```toml
/// [safety]
/// destructive_tools = ["delete_note", "move_note"]
/// pending_ttl_secs = 900
/// card_retention_secs = 3600
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSafetyConfig {
    pub destructive_tools: Vec<String>,
    pub pending_ttl_secs: u64,
    /// Seconds a confirmed, cancelled or expired card stays visible.
    pub card_retention_secs: u64,
}

impl Default for FileSafetyConfig {
    fn default() -> Self {
        let defaults = SafetyParams::default();
        Self {
            destructive_tools: defaults.destructive_tools,
            pending_ttl_secs: defaults.pending_ttl.as_secs(),
            card_retention_secs: defaults.card_retention.as_secs(),
        }
    }
}

pub(crate) fn validate(critic: &FileCriticConfig, safety: &FileSafetyConfig) -> Vec<ConfigIssue> {
    let mut issues: Vec<ConfigIssue> = [
        empty_model("critic.model", &critic.model),
        zero_timeout("critic.timeout_secs", critic.timeout_secs),
        zero_timeout("safety.pending_ttl_secs", safety.pending_ttl_secs),
    ]
    .into_iter()
    .flatten()
    .collect();

    for tool in &critic.fail_open_tools {
        let key = tool_key(tool);
        if !safety.destructive_tools.iter().any(|d| tool_key(d) == key) {
            issues.push(ConfigIssue::warning(
                ConfigValidationError::FailOpenNotDestructive(tool.clone()),
            ));
        }
    }
    issues
}

pub(crate) fn to_params(critic: &FileCriticConfig, safety: &FileSafetyConfig) -> SafetyParams {
    SafetyParams {
        destructive_tools: safety.destructive_tools.clone(),
        fail_open_tools: critic.fail_open_tools.clone(),
        pending_ttl: Duration::from_secs(safety.pending_ttl_secs),
        card_retention: Duration::from_secs(safety.card_retention_secs),
        critic_timeout: Duration::from_secs(critic.timeout_secs),
    }
}
