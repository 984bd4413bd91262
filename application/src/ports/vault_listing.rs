//! Vault listing port
//!
//! Authoritative list of every note path in the vault, used to resolve
//! loosely written note names.

use crate::ports::tool_provider::ProviderError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait VaultListing: Send + Sync {
    async fn list_all_paths(&self, cancel: &CancellationToken)
    -> Result<Vec<String>, ProviderError>;
}
