//! Tool selection: which catalog tools an agent sees for a turn.

use std::collections::HashSet;
use vaultpilot_domain::ToolDescriptor;
use vaultpilot_domain::tool::entities::tool_key;

/// Words shorter than this never drive a keyword match.
const MIN_KEYWORD_LEN: usize = 3;

pub trait ToolSelector: Send + Sync {
    fn select(&self, message: &str, tools: &[ToolDescriptor]) -> Vec<ToolDescriptor>;
}

/// Offer every tool in the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllTools;

impl ToolSelector for AllTools {
    fn select(&self, _message: &str, tools: &[ToolDescriptor]) -> Vec<ToolDescriptor> {
        tools.to_vec()
    }
}

/// Offer tools whose name or description shares a word with the message.
///
/// Core tools are always offered. When no other tool matches, every tool is
/// offered so the agent is never left without options.
#[derive(Debug, Clone, Default)]
pub struct KeywordToolSelector {
    core: HashSet<String>,
}

impl KeywordToolSelector {
    pub fn new<I, S>(core_tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            core: core_tools.into_iter().map(|s| tool_key(s.as_ref())).collect(),
        }
    }
}

fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

impl ToolSelector for KeywordToolSelector {
    fn select(&self, message: &str, tools: &[ToolDescriptor]) -> Vec<ToolDescriptor> {
        let wanted = keywords(message);

        let mut matched_any = false;
        let selected: Vec<ToolDescriptor> = tools
            .iter()
            .filter(|tool| {
                if self.core.contains(&tool.key()) {
                    return true;
                }
                let vocabulary = keywords(&format!("{} {}", tool.name, tool.description));
                let hit = !vocabulary.is_disjoint(&wanted);
                matched_any |= hit;
                hit
            })
            .cloned()
            .collect();

        if matched_any {
            selected
        } else {
            tools.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("read_note", "vault").with_description("Read a note"),
            ToolDescriptor::new("delete_note", "vault").with_description("Delete a note"),
            ToolDescriptor::new("web_search", "search").with_description("Search the web"),
            ToolDescriptor::new("list_notes", "vault").with_description("List every path"),
        ]
    }

    fn names(tools: &[ToolDescriptor]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_all_tools_keeps_everything() {
        assert_eq!(AllTools.select("anything", &catalog()).len(), 4);
    }

    #[test]
    fn test_keyword_selector_matches_names_and_descriptions() {
        let selector = KeywordToolSelector::new(["list_notes"]);
        let selected = selector.select("please search the web for rust", &catalog());
        assert_eq!(names(&selected), vec!["web_search", "list_notes"]);
    }

    #[test]
    fn test_keyword_selector_falls_back_to_all() {
        let selector = KeywordToolSelector::new(["list_notes"]);
        let selected = selector.select("hi", &catalog());
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn test_keyword_selector_is_case_insensitive() {
        let selector = KeywordToolSelector::default();
        let selected = selector.select("DELETE my old draft", &catalog());
        assert_eq!(names(&selected), vec!["delete_note"]);
    }
}
