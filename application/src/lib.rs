//! Application layer for vaultpilot
//!
//! This crate contains the ports (async traits for every external
//! collaborator), the use cases of the tool-invocation pipeline and the
//! typed pipeline configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod threads;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CatalogParams, PipelineConfig, SafetyParams, TurnParams};
pub use ports::{
    agent_runtime::{AgentError, AgentRuntime, AgentSpec, AgentStream, ChatAgent},
    llm_gateway::{CompletionGateway, GatewayError},
    risk_assessor::{AssessmentError, RiskAssessor},
    thread_store::{ThreadStore, ThreadStoreError},
    tool_executor::ToolExecutorPort,
    tool_provider::{ProviderError, ToolServer},
    vault_listing::VaultListing,
};
pub use threads::ShardedThreadStore;
pub use use_cases::catalog_executor::CatalogExecutor;
pub use use_cases::critic::ModelCritic;
pub use use_cases::path_resolver::PathResolver;
pub use use_cases::run_turn::{RunTurnInput, TurnError, TurnOrchestrator, TurnStream};
pub use use_cases::safety_gate::{GateError, GatedExecutor, SafetyGate};
pub use use_cases::tool_catalog::{CatalogError, ToolCatalog};
pub use use_cases::tool_selection::{AllTools, KeywordToolSelector, ToolSelector};
