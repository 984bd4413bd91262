//! Domain layer for vaultpilot
//!
//! This crate contains the core types and pure logic of the tool-invocation
//! pipeline. It has no dependencies on infrastructure or I/O.
//!
//! # Core Concepts
//!
//! ## Tool catalog
//!
//! Tools are discovered from several independent provider servers and
//! merged into an immutable [`CatalogSnapshot`] (first-seen wins,
//! case-insensitive names).
//!
//! ## Safety gate
//!
//! Destructive calls are never executed directly. They become an
//! [`ActionCard`] in `Pending` plus a [`PendingInvocation`] keyed by a
//! single-use [`ReflectionKey`], and only run after an explicit confirm.
//!
//! ## Streaming turns
//!
//! A turn is observed as an ordered sequence of [`StreamEvent`]s that
//! always ends with exactly one `Done` or `Error`.

pub mod catalog;
pub mod core;
pub mod prompt;
pub mod safety;
pub mod stream;
pub mod thread;
pub mod tool;
pub mod vault;

// Re-export commonly used types
pub use catalog::{CatalogSnapshot, ServerDiscovery, ServerToolCount};
pub use core::error::DomainError;
pub use prompt::CriticPromptTemplate;
pub use safety::{
    ActionCard, ActionStatus, CriticFailureMode, OperationKind, PendingInvocation,
    PlannedOperation, ReflectionKey, RiskAssessment, SafetyPolicy, Verdict, describe_operations,
    parse_assessment, plan_operations,
};
pub use stream::{
    AgentUnit, StreamEvent, ToolResultPayload, TurnFailure, TurnMetadata, TurnSummary,
};
pub use thread::{ThreadHandle, ThreadId};
pub use tool::{ToolArguments, ToolCall, ToolDescriptor, ToolInvocationResult, ToolOutcome};
pub use vault::PathNormalizer;
