//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_runtime;
pub mod llm_gateway;
pub mod risk_assessor;
pub mod thread_store;
pub mod tool_executor;
pub mod tool_provider;
pub mod vault_listing;
