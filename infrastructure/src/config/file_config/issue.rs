//! Configuration validation issues

use thiserror::Error;

/// How bad a configuration issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    ZeroTimeout { field: String },

    #[error("{field}: model name cannot be empty")]
    EmptyModelName { field: String },

    #[error("servers: duplicate server id '{0}'")]
    DuplicateServerId(String),

    #[error("servers: server '{0}' has an empty url")]
    EmptyServerUrl(String),

    #[error("critic.fail_open_tools: '{0}' is not in safety.destructive_tools and will be ignored")]
    FailOpenNotDestructive(String),

    #[error("agent.tool_selection: unknown value '{0}', falling back to 'all'")]
    UnknownToolSelection(String),

    #[error("agent.max_tool_rounds cannot be 0")]
    ZeroToolRounds,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigValidationError,
}

impl ConfigIssue {
    pub fn error(code: ConfigValidationError) -> Self {
        Self {
            severity: Severity::Error,
            code,
        }
    }

    pub fn warning(code: ConfigValidationError) -> Self {
        Self {
            severity: Severity::Warning,
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn message(&self) -> String {
        self.code.to_string()
    }
}

/// `Some(issue)` when a seconds value is zero.
pub(crate) fn zero_timeout(field: &str, secs: u64) -> Option<ConfigIssue> {
    (secs == 0).then(|| {
        ConfigIssue::error(ConfigValidationError::ZeroTimeout {
            field: field.to_string(),
        })
    })
}

/// `Some(issue)` when a model name is blank.
pub(crate) fn empty_model(field: &str, model: &str) -> Option<ConfigIssue> {
    model.trim().is_empty().then(|| {
        ConfigIssue::error(ConfigValidationError::EmptyModelName {
            field: field.to_string(),
        })
    })
}
