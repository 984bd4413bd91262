//! Pipeline parameters - use case control.
//!
//! [`PipelineConfig`] groups the static parameters that control the
//! catalog, the safety gate and the turn loop. The infrastructure layer
//! builds it from the TOML/env configuration; tests build it directly.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vaultpilot_domain::SafetyPolicy;
use vaultpilot_domain::vault::DEFAULT_EXTENSION;

/// Tool catalog refresh control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogParams {
    /// How long a merged snapshot stays fresh.
    pub ttl: Duration,
    /// Budget for one server's `ListTools` call.
    pub discovery_timeout: Duration,
    /// Budget for one `CallTool` issued by the catalog executor.
    pub call_timeout: Duration,
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            discovery_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// Safety gate control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyParams {
    /// Tool names that require confirmation.
    pub destructive_tools: Vec<String>,
    /// Destructive tools that may still reach confirmation without an
    /// assessment when the critic is unavailable.
    pub fail_open_tools: Vec<String>,
    /// How long a pending invocation waits for confirm/cancel.
    pub pending_ttl: Duration,
    /// How long a resolved card stays available for lookup.
    pub card_retention: Duration,
    /// Budget for one critic assessment.
    pub critic_timeout: Duration,
}

impl Default for SafetyParams {
    fn default() -> Self {
        Self {
            destructive_tools: vec![
                "delete_note".to_string(),
                "move_note".to_string(),
                "rename_note".to_string(),
                "write_note".to_string(),
                "overwrite_note".to_string(),
            ],
            fail_open_tools: Vec::new(),
            pending_ttl: Duration::from_secs(15 * 60),
            card_retention: Duration::from_secs(60 * 60),
            critic_timeout: Duration::from_secs(30),
        }
    }
}

impl SafetyParams {
    pub fn policy(&self) -> SafetyPolicy {
        SafetyPolicy::new(&self.destructive_tools).with_fail_open(&self.fail_open_tools)
    }
}

/// Turn loop control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnParams {
    /// System instructions for the conversational agent.
    pub instructions: String,
    /// Budget for the whole streaming completion of one turn.
    pub completion_timeout: Duration,
    /// Capacity of the event channel handed to the caller.
    pub event_buffer: usize,
}

impl Default for TurnParams {
    fn default() -> Self {
        Self {
            instructions: "You are a careful assistant for a personal notes vault. \
                           Use the available tools to read and organize notes. \
                           Destructive operations are proposed as action cards and \
                           only run after the user confirms them."
                .to_string(),
            completion_timeout: Duration::from_secs(180),
            event_buffer: 64,
        }
    }
}

/// Everything the use cases need, converted from the raw configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub catalog: CatalogParams,
    pub safety: SafetyParams,
    pub turn: TurnParams,
    /// Extension every vault note path carries.
    pub vault_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogParams::default(),
            safety: SafetyParams::default(),
            turn: TurnParams::default(),
            vault_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl PipelineConfig {
    // ==================== Builder Methods ====================

    pub fn with_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog.ttl = ttl;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.catalog.discovery_timeout = timeout;
        self
    }

    pub fn with_destructive_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.safety.destructive_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fail_open_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.safety.fail_open_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.safety.pending_ttl = ttl;
        self
    }

    pub fn with_critic_timeout(mut self, timeout: Duration) -> Self {
        self.safety.critic_timeout = timeout;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.turn.completion_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_covers_delete() {
        let policy = PipelineConfig::default().safety.policy();
        assert!(policy.is_destructive("delete_note"));
        assert!(policy.is_destructive("DELETE_NOTE"));
        assert!(!policy.is_destructive("read_note"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::default()
            .with_catalog_ttl(Duration::from_secs(5))
            .with_destructive_tools(["purge"])
            .with_fail_open_tools(["purge", "read_note"]);

        assert_eq!(config.catalog.ttl, Duration::from_secs(5));
        let policy = config.safety.policy();
        assert!(policy.is_destructive("purge"));
        assert!(!policy.is_destructive("delete_note"));
    }
}
