//! Tool domain module
//!
//! Tools are named remote capabilities advertised by independent provider
//! servers. The agent never sees a server directly: it sees the merged
//! [`ToolDescriptor`] list of the current catalog snapshot, issues
//! [`ToolCall`]s against it, and receives [`ToolInvocationResult`]s back.
//!
//! ```text
//! ┌────────────────┐    ┌──────────────┐    ┌──────────────────────┐
//! │ ToolDescriptor │───▶│ ToolCall     │───▶│ ToolInvocationResult │
//! │ (snapshot)     │    │ (agent)      │    │ outcome + card?      │
//! └────────────────┘    └──────────────┘    └──────────────────────┘
//! ```
//!
//! Tool names are compared case-insensitively everywhere (see [`tool_key`]).

pub mod entities;
pub mod value_objects;

pub use entities::{ToolArguments, ToolCall, ToolDescriptor, tool_key};
pub use value_objects::{ToolInvocationResult, ToolOutcome};
