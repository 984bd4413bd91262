//! Pending invocations and their single-use reflection keys.

use crate::core::error::DomainError;
use crate::tool::entities::{ToolArguments, ToolCall};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Single-use token correlating a deferred call with its confirm/cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReflectionKey(String);

impl ReflectionKey {
    /// Generate a fresh, unguessable key.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accept a key supplied by a client (trimmed, non-empty, no whitespace).
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidReflectionKey(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReflectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReflectionKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A destructive call waiting for an explicit confirm or cancel.
#[derive(Debug, Clone)]
pub struct PendingInvocation {
    pub key: ReflectionKey,
    pub function_name: String,
    pub arguments: ToolArguments,
    pub expires_at: Instant,
}

impl PendingInvocation {
    pub fn new(key: ReflectionKey, call: &ToolCall, ttl: Duration) -> Self {
        Self {
            key,
            function_name: call.name.clone(),
            arguments: call.arguments.clone(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Rebuild the call that will run on confirmation.
    pub fn to_call(&self) -> ToolCall {
        ToolCall::new(self.function_name.clone()).with_arguments(self.arguments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_unique() {
        let a = ReflectionKey::generate();
        let b = ReflectionKey::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(ReflectionKey::parse("  abc ").unwrap().as_str(), "abc");
        assert!(ReflectionKey::parse("   ").is_err());
        assert!(ReflectionKey::parse("a b").is_err());
        assert!("xyz".parse::<ReflectionKey>().is_ok());
    }

    #[test]
    fn test_pending_expiry() {
        let call = ToolCall::new("delete_note").with_arg("path", "a.md");
        let pending = PendingInvocation::new(ReflectionKey::generate(), &call, Duration::from_secs(60));
        assert!(!pending.is_expired());
        assert!(pending.is_expired_at(pending.expires_at));

        let expired = PendingInvocation::new(ReflectionKey::generate(), &call, Duration::ZERO);
        assert!(expired.is_expired());
    }

    #[test]
    fn test_pending_to_call_round_trips_arguments() {
        let call = ToolCall::new("delete_note").with_arg("path", "a.md");
        let pending = PendingInvocation::new(ReflectionKey::generate(), &call, Duration::from_secs(1));
        let rebuilt = pending.to_call();
        assert_eq!(rebuilt.name, "delete_note");
        assert_eq!(rebuilt.get_string("path"), Some("a.md"));
    }
}
