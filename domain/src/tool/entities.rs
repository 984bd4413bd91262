//! Tool domain entities

use serde::{Deserialize, Serialize};

/// JSON object arguments passed to a tool.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// A callable tool advertised by one provider server.
///
/// Immutable once discovered; scoped to the [`CatalogSnapshot`](crate::CatalogSnapshot)
/// it was merged into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name as advertised by the server (e.g., "delete_note")
    pub name: String,
    /// Id of the provider server that advertised this tool
    pub server: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool's input
    #[serde(default = "empty_object_schema")]
    pub schema: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            description: String::new(),
            schema: empty_object_schema(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = schema;
        self
    }

    /// Case-insensitive identity used for deduplication across servers.
    pub fn key(&self) -> String {
        tool_key(&self.name)
    }
}

/// Normalize a tool name for case-insensitive comparison.
pub fn tool_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A call to a tool requested by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Runtime-assigned call id, when the agent runtime provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the tool to call
    pub name: String,
    /// Arguments passed to the tool
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: ToolArguments::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: ToolArguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}
