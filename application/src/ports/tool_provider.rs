//! Tool provider port
//!
//! A [`ToolServer`] is one independent remote service that advertises tools
//! (`ListTools`) and executes them (`CallTool`). Servers fail and time out
//! independently; the catalog treats every error here as "this server
//! contributed nothing" rather than as a failed refresh.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ToolCatalog                  │
//! │  (fan-out, merge first-seen-wins, TTL cache) │
//! └──────────────────────────────────────────────┘
//!        │               │               │
//!        ▼               ▼               ▼
//!  ┌──────────┐    ┌──────────┐    ┌──────────┐
//!  │ server A │    │ server B │    │ server C │
//!  └──────────┘    └──────────┘    └──────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use vaultpilot_domain::{ToolArguments, ToolDescriptor, ToolOutcome};

/// Error type for provider (and listing service) operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Server could not be reached
    #[error("Provider not available: {0}")]
    Unavailable(String),

    /// Server answered but the listing could not be produced
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Tool not offered by this server
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Transport-level failure while calling a tool
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Server answered with something we could not decode
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

/// One remote tool provider service.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Unique identifier of this server (e.g., "vault", "search")
    fn id(&self) -> &str;

    /// Discover the tools this server currently offers.
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolDescriptor>, ProviderError>;

    /// Execute one tool on this server.
    ///
    /// A tool-level failure is an `Ok(ToolOutcome { is_error: true, .. })`;
    /// `Err` is reserved for transport failures.
    async fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
        cancel: &CancellationToken,
    ) -> Result<ToolOutcome, ProviderError>;
}
