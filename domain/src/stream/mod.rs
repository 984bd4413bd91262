//! Streaming domain module

pub mod event;

pub use event::{
    AgentUnit, StreamEvent, ToolResultPayload, TurnFailure, TurnMetadata, TurnSummary,
};
