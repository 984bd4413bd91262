//! Vault domain module
//!
//! Pure path normalization and listing match selection. Fetching the
//! authoritative listing is an application concern (`PathResolver`).

pub mod path;

pub use path::{DEFAULT_EXTENSION, PathNormalizer};
