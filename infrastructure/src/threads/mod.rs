//! Durable thread storage
//!
//! - [`FileThreadStore`]: conversation id → runtime thread reference
//! - [`TranscriptStore`]: the messages behind a runtime thread reference

mod file_store;
mod transcript;

pub use file_store::FileThreadStore;
pub use transcript::TranscriptStore;
