//! Infrastructure layer for vaultpilot
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod error;
mod fs;
pub mod http;
pub mod mcp;
pub mod openai;
pub mod threads;
pub mod vault;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, ConfigValidationError, FileConfig, Severity, ToolSelectionMode,
};
pub use error::{HttpAdapterError, Result};
pub use mcp::HttpToolServer;
pub use openai::{OpenAiAgentRuntime, OpenAiClient, OpenAiCompletionGateway};
pub use threads::{FileThreadStore, TranscriptStore};
pub use vault::{HttpVaultListing, UnconfiguredVaultListing};
