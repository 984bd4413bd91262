//! Agent configuration from TOML (`[agent]` section)

use super::issue::{ConfigIssue, ConfigValidationError, empty_model, zero_timeout};
use serde::{Deserialize, Serialize};
use vaultpilot_application::TurnParams;

/// Which tools are offered to the model on each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolSelectionMode {
    /// Every tool of the current catalog snapshot.
    #[default]
    All,
    /// Tools sharing a keyword with the user message, plus `core_tools`.
    Keyword,
}

impl std::str::FromStr for ToolSelectionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "keyword" | "keywords" => Ok(Self::Keyword),
            _ => Err(()),
        }
    }
}

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agent]
/// model = "gpt-4o-mini"
/// completion_timeout_secs = 180
/// max_tool_rounds = 8
/// tool_selection = "keyword"          # "all" or "keyword"
/// core_tools = ["search_notes"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Conversational model
    pub model: String,
    /// System instructions; built-in text when unset
    pub instructions: Option<String>,
    /// Budget for one whole streaming completion
    pub completion_timeout_secs: u64,
    /// Tool rounds per turn before the runtime gives up
    pub max_tool_rounds: usize,
    /// Max tokens per completion (provider default when unset)
    pub max_tokens: Option<u32>,
    /// "all" or "keyword"
    pub tool_selection: String,
    /// Tools always offered by the keyword selector
    pub core_tools: Vec<String>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            instructions: None,
            completion_timeout_secs: 180,
            max_tool_rounds: 8,
            max_tokens: None,
            tool_selection: "all".to_string(),
            core_tools: Vec::new(),
        }
    }
}

impl FileAgentConfig {
    /// Parse `tool_selection`, returning a warning on unknown values.
    pub fn parse_tool_selection(&self) -> (ToolSelectionMode, Vec<ConfigIssue>) {
        match self.tool_selection.parse::<ToolSelectionMode>() {
            Ok(mode) => (mode, vec![]),
            Err(()) => (
                ToolSelectionMode::default(),
                vec![ConfigIssue::warning(
                    ConfigValidationError::UnknownToolSelection(self.tool_selection.clone()),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> = [
            empty_model("agent.model", &self.model),
            zero_timeout("agent.completion_timeout_secs", self.completion_timeout_secs),
        ]
        .into_iter()
        .flatten()
        .collect();
        if self.max_tool_rounds == 0 {
            issues.push(ConfigIssue::error(ConfigValidationError::ZeroToolRounds));
        }
        issues.extend(self.parse_tool_selection().1);
        issues
    }

    pub(crate) fn apply(&self, params: &mut TurnParams) {
        if let Some(instructions) = &self.instructions {
            params.instructions = instructions.clone();
        }
        params.completion_timeout = std::time::Duration::from_secs(self.completion_timeout_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_selection() {
        let mut config = FileAgentConfig::default();
        assert_eq!(config.parse_tool_selection().0, ToolSelectionMode::All);

        config.tool_selection = "Keyword".to_string();
        assert_eq!(config.parse_tool_selection().0, ToolSelectionMode::Keyword);

        config.tool_selection = "semantic".to_string();
        let (mode, issues) = config.parse_tool_selection();
        assert_eq!(mode, ToolSelectionMode::All);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_validate_catches_zero_values() {
        let config = FileAgentConfig {
            model: String::new(),
            completion_timeout_secs: 0,
            max_tool_rounds: 0,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(ConfigIssue::is_error));
    }

    #[test]
    fn test_apply_keeps_default_instructions() {
        let mut params = TurnParams::default();
        let default_instructions = params.instructions.clone();
        FileAgentConfig::default().apply(&mut params);
        assert_eq!(params.instructions, default_instructions);

        let config = FileAgentConfig {
            instructions: Some("Answer in French.".to_string()),
            completion_timeout_secs: 30,
            ..Default::default()
        };
        config.apply(&mut params);
        assert_eq!(params.instructions, "Answer in French.");
        assert_eq!(params.completion_timeout.as_secs(), 30);
    }
}
