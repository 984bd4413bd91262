//! JSON-RPC protocol types for tool provider servers.
//!
//! Tool servers speak JSON-RPC 2.0 over plain HTTP POST, one request per
//! exchange.
//!
//! # Methods
//!
//! - `tools/list` → `{ "tools": [{ "name", "description", "inputSchema" }] }`
//! - `tools/call` with `{ "name", "arguments" }` →
//!   `{ "content": [{ "type": "text", "text" }], "isError": bool }`

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use vaultpilot_domain::{ToolArguments, ToolDescriptor, ToolOutcome};

/// Global request ID counter for JSON-RPC requests.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

pub const METHOD_LIST_TOOLS: &str = "tools/list";
pub const METHOD_CALL_TOOL: &str = "tools/call";

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with an auto-generated ID.
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_id(),
            method: method.into(),
            params,
        }
    }

    pub fn list_tools() -> Self {
        Self::new(METHOD_LIST_TOOLS, None)
    }

    pub fn call_tool(name: &str, arguments: &ToolArguments) -> Self {
        Self::new(
            METHOD_CALL_TOOL,
            Some(serde_json::json!({ "name": name, "arguments": arguments })),
        )
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// One tool as advertised by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: Option<serde_json::Value>,
}

impl RemoteTool {
    pub fn into_descriptor(self, server: &str) -> ToolDescriptor {
        let descriptor = ToolDescriptor::new(self.name, server).with_description(self.description);
        match self.input_schema {
            Some(schema) => descriptor.with_schema(schema),
            None => descriptor,
        }
    }
}

/// `tools/list` result
#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<RemoteTool>,
}

/// One content block of a `tools/call` result
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// `tools/call` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Concatenate the text blocks; non-text blocks are skipped.
    pub fn into_outcome(self) -> ToolOutcome {
        let content = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");
        if self.is_error {
            ToolOutcome::failure(content)
        } else {
            ToolOutcome::success(content)
        }
    }
}
