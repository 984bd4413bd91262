//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod catalog_executor;
pub mod critic;
pub mod path_resolver;
pub mod run_turn;
pub mod safety_gate;
pub mod tool_catalog;
pub mod tool_selection;
