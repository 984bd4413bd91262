//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! [`PipelineConfig`] once validated.

mod agent;
mod catalog;
mod issue;
mod providers;
mod safety;
mod storage;

pub use agent::{FileAgentConfig, ToolSelectionMode};
pub use catalog::{FileCatalogConfig, FileServerConfig};
pub use issue::{ConfigIssue, ConfigValidationError, Severity};
pub use providers::FileOpenAiConfig;
pub use safety::{FileCriticConfig, FileSafetyConfig};
pub use storage::{FileThreadsConfig, FileVaultConfig};

use serde::{Deserialize, Serialize};
use vaultpilot_application::{PipelineConfig, TurnParams};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Conversational agent settings
    pub agent: FileAgentConfig,
    /// Critic model settings
    pub critic: FileCriticConfig,
    /// Destructive-operation settings
    pub safety: FileSafetyConfig,
    /// Tool catalog cache settings
    pub catalog: FileCatalogConfig,
    /// Tool provider servers, in merge order
    pub servers: Vec<FileServerConfig>,
    /// Vault listing settings
    pub vault: FileVaultConfig,
    /// OpenAI-compatible API settings
    pub openai: FileOpenAiConfig,
    /// Durable thread storage
    pub threads: FileThreadsConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.agent.validate());
        issues.extend(safety::validate(&self.critic, &self.safety));
        issues.extend(catalog::validate(&self.catalog, &self.servers));
        issues.extend(self.openai.validate());
        issues
    }

    /// Whether any issue is fatal.
    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(ConfigIssue::is_error)
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let mut turn = TurnParams::default();
        self.agent.apply(&mut turn);
        PipelineConfig {
            catalog: self.catalog.to_params(),
            safety: safety::to_params(&self.critic, &self.safety),
            turn,
            vault_extension: self.vault.extension.clone(),
        }
    }
}
