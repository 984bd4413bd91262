//! Conversation thread handles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry key of a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for threads created without a conversation id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Opaque dialogue handle preserving multi-turn context.
///
/// `runtime_ref` is whatever the agent runtime needs to find its own
/// conversation state again; the core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadHandle {
    pub id: ThreadId,
    pub runtime_ref: String,
    pub created_at: DateTime<Utc>,
}

impl ThreadHandle {
    pub fn new(id: impl Into<ThreadId>, runtime_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            runtime_ref: runtime_ref.into(),
            created_at: Utc::now(),
        }
    }
}
