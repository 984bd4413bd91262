//! Destructive-operation policy.

use crate::tool::entities::tool_key;
use std::collections::HashSet;

/// Which tools require confirmation, and which may still reach the
/// confirmation step when the critic is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyPolicy {
    destructive: HashSet<String>,
    fail_open: HashSet<String>,
}

/// Critic-unavailability behaviour for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticFailureMode {
    /// Block the call and surface an error (default).
    FailClosed,
    /// Still create a pending card, flagged as unassessed.
    ProceedToConfirmation,
}

impl SafetyPolicy {
    pub fn new<I, S>(destructive: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            destructive: destructive.into_iter().map(|s| tool_key(s.as_ref())).collect(),
            fail_open: HashSet::new(),
        }
    }

    /// Allow these tools to proceed to confirmation without an assessment.
    ///
    /// Names that are not in the destructive set are ignored.
    pub fn with_fail_open<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fail_open = tools
            .into_iter()
            .map(|s| tool_key(s.as_ref()))
            .filter(|key| self.destructive.contains(key))
            .collect();
        self
    }

    pub fn is_destructive(&self, tool_name: &str) -> bool {
        self.destructive.contains(&tool_key(tool_name))
    }

    pub fn critic_failure_mode(&self, tool_name: &str) -> CriticFailureMode {
        if self.fail_open.contains(&tool_key(tool_name)) {
            CriticFailureMode::ProceedToConfirmation
        } else {
            CriticFailureMode::FailClosed
        }
    }

    pub fn destructive_tools(&self) -> impl Iterator<Item = &str> {
        self.destructive.iter().map(String::as_str)
    }
}
