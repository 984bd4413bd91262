//! Thread domain module
//!
//! Opaque per-conversation handles. Storage is an application port
//! (`ThreadStore`); this module only defines what is stored.

pub mod handle;

pub use handle::{ThreadHandle, ThreadId};
