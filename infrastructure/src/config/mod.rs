//! Configuration file loading for vaultpilot
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VAULTPILOT_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./vaultpilot.toml` or `./.vaultpilot.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/vaultpilot/config.toml`
//!    (fallback `~/.config/vaultpilot/config.toml`)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, ConfigValidationError, FileAgentConfig, FileCatalogConfig, FileConfig,
    FileCriticConfig, FileOpenAiConfig, FileSafetyConfig, FileServerConfig, FileThreadsConfig,
    FileVaultConfig, Severity, ToolSelectionMode,
};
pub use loader::ConfigLoader;
