//! Tool catalog domain module
//!
//! Pure merge logic for the tool catalog. Discovery, caching and locking
//! live in the application layer (`ToolCatalog`); this module only decides
//! what a finished refresh looks like.

pub mod snapshot;

pub use snapshot::{CatalogSnapshot, ServerDiscovery, ServerToolCount};
