//! Application-level configuration.
//!
//! [`PipelineConfig`] bundles the parameters that control how the use cases
//! behave: catalog TTL and timeouts, the destructive-tool policy and the
//! turn loop.

pub mod pipeline;

pub use pipeline::{CatalogParams, PipelineConfig, SafetyParams, TurnParams};
