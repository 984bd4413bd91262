//! Catalog-backed tool executor.
//!
//! Routes a call to the server that contributed the tool to the current
//! catalog snapshot. This is the "real" executor that sits behind the
//! safety gate.

use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_provider::ProviderError;
use crate::use_cases::tool_catalog::ToolCatalog;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vaultpilot_domain::{ToolCall, ToolInvocationResult, ToolOutcome};

pub struct CatalogExecutor {
    catalog: Arc<ToolCatalog>,
}

impl CatalogExecutor {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self { catalog }
    }

    async fn dispatch(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<ToolOutcome, ProviderError> {
        let snapshot = self
            .catalog
            .get_tools(cancel)
            .await
            .map_err(|_| ProviderError::Cancelled)?;

        let descriptor = snapshot
            .get(&call.name)
            .ok_or_else(|| ProviderError::ToolNotFound(call.name.clone()))?;
        let server = self
            .catalog
            .server(&descriptor.server)
            .ok_or_else(|| ProviderError::Unavailable(descriptor.server.clone()))?;

        debug!(tool = %descriptor.name, server = %descriptor.server, "Dispatching tool call");

        let timeout = self.catalog.params().call_timeout;
        let call_future = server.call_tool(&descriptor.name, &call.arguments, cancel);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = tokio::time::timeout(timeout, call_future) => {
                result.map_err(|_| ProviderError::Timeout)?
            }
        }
    }
}

#[async_trait]
impl ToolExecutorPort for CatalogExecutor {
    async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolInvocationResult {
        let outcome = match self.dispatch(call, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolOutcome::failure(e.to_string())
            }
        };
        ToolInvocationResult::for_call(call, outcome)
    }
}
