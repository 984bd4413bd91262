//! HTTP tool server adapter

use super::protocol::{CallToolResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult};
use crate::error::{HttpAdapterError, Result};
use crate::http;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vaultpilot_application::{ProviderError, ToolServer};
use vaultpilot_domain::{ToolArguments, ToolDescriptor, ToolOutcome};

/// A tool provider reachable at a JSON-RPC endpoint.
pub struct HttpToolServer {
    id: String,
    url: String,
    client: reqwest::Client,
}

impl HttpToolServer {
    pub fn new(id: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Result<T> {
        debug!(server = %self.id, method = %request.method, id = request.id, "JSON-RPC request");
        let response: JsonRpcResponse =
            http::post_json(self.client.post(&self.url), &request, cancel).await?;

        if let Some(error) = response.error {
            return Err(HttpAdapterError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = response.result.ok_or_else(|| {
            HttpAdapterError::UnexpectedResponse("response has neither result nor error".into())
        })?;
        Ok(serde_json::from_value(result)?)
    }
}

#[async_trait]
impl ToolServer for HttpToolServer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<ToolDescriptor>, ProviderError> {
        let result: ListToolsResult = self
            .rpc(JsonRpcRequest::list_tools(), cancel)
            .await
            .map_err(|e| match e {
                HttpAdapterError::Rpc { .. } => ProviderError::DiscoveryFailed(e.to_string()),
                other => other.into(),
            })?;

        Ok(result
            .tools
            .into_iter()
            .map(|tool| tool.into_descriptor(&self.id))
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
        cancel: &CancellationToken,
    ) -> std::result::Result<ToolOutcome, ProviderError> {
        let result: CallToolResult = self
            .rpc(JsonRpcRequest::call_tool(name, arguments), cancel)
            .await
            .map_err(ProviderError::from)?;
        Ok(result.into_outcome())
    }
}
