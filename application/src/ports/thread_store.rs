//! Thread store port
//!
//! A key → handle registry for conversation threads. It has no
//! conversational semantics: the runtime owns what a thread means, the
//! store only remembers which handle belongs to which id.

use async_trait::async_trait;
use thiserror::Error;
use vaultpilot_domain::{ThreadHandle, ThreadId};

#[derive(Error, Debug)]
pub enum ThreadStoreError {
    #[error("Thread store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid thread id: {0}")]
    InvalidId(String),

    #[error("Corrupt thread record {id}: {message}")]
    Corrupt { id: String, message: String },

    #[error("Thread store error: {0}")]
    Other(String),
}

#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Create and register a handle with a fresh id (also used as its
    /// runtime reference).
    async fn create(&self) -> Result<ThreadHandle, ThreadStoreError>;

    async fn get(&self, id: &ThreadId) -> Result<Option<ThreadHandle>, ThreadStoreError>;

    /// Insert or replace a handle under its own id.
    async fn register(&self, handle: ThreadHandle) -> Result<ThreadId, ThreadStoreError>;

    /// Remove a handle. Removing an unknown id is not an error.
    async fn delete(&self, id: &ThreadId) -> Result<(), ThreadStoreError>;

    /// Drop every handle (shutdown or test reset).
    async fn clear(&self) -> Result<(), ThreadStoreError>;
}
