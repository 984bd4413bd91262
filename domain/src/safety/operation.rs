//! Planned operations derived from a destructive tool call.
//!
//! An [`ActionCard`](super::action_card::ActionCard) owns a flat list of
//! [`PlannedOperation`]s. Operations never point back to their card.

use crate::core::string::value_preview;
use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// Argument names that carry the primary target path of a tool call.
pub const PATH_ARGUMENT_KEYS: &[&str] = &["path", "file", "filename", "note", "target"];

/// Argument names that carry a list of target paths.
const PATH_LIST_KEYS: &[&str] = &["paths", "files", "notes"];

/// Argument names that carry the destination of a move/rename.
const DESTINATION_KEYS: &[&str] = &["destination", "new_path", "to", "new_name"];

/// Argument names that carry content to be written.
const CONTENT_KEYS: &[&str] = &["content", "text", "body"];

/// Kind of change an operation makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Delete,
    Move,
    Write,
    Execute,
    Other,
}

impl OperationKind {
    /// Guess the kind of change from a tool name.
    pub fn classify(tool_name: &str) -> Self {
        let name = tool_name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["delete", "remove", "trash", "purge", "erase"]) {
            OperationKind::Delete
        } else if has(&["move", "rename"]) {
            OperationKind::Move
        } else if has(&["write", "create", "append", "update", "edit", "replace", "patch", "overwrite"]) {
            OperationKind::Write
        } else if has(&["run", "exec", "command", "shell"]) {
            OperationKind::Execute
        } else {
            OperationKind::Other
        }
    }

    pub fn verb(&self) -> &str {
        match self {
            OperationKind::Delete => "Delete",
            OperationKind::Move => "Move",
            OperationKind::Write => "Write",
            OperationKind::Execute => "Execute",
            OperationKind::Other => "Run",
        }
    }
}

/// One concrete change an action card proposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    pub kind: OperationKind,
    /// Path or resource the operation touches, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Extra human-readable detail (destination, content size, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl PlannedOperation {
    pub fn new(kind: OperationKind, target: Option<String>) -> Self {
        Self {
            kind,
            target,
            detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// One-line summary, e.g. "Delete `notes/todo.md`".
    pub fn summary(&self) -> String {
        let mut line = match &self.target {
            Some(target) => format!("{} `{}`", self.kind.verb(), target),
            None => self.kind.verb().to_string(),
        };
        if !self.detail.is_empty() {
            line.push_str(&format!(" ({})", self.detail));
        }
        line
    }
}

/// First path-like argument of a call, with the key it was found under.
pub fn primary_path_argument(call: &ToolCall) -> Option<(&'static str, &str)> {
    PATH_ARGUMENT_KEYS
        .iter()
        .find_map(|key| call.get_string(key).map(|value| (*key, value)))
}

/// Derive the operations a destructive call would perform.
pub fn plan_operations(call: &ToolCall) -> Vec<PlannedOperation> {
    let kind = OperationKind::classify(&call.name);

    let detail = match kind {
        OperationKind::Move => DESTINATION_KEYS
            .iter()
            .find_map(|key| call.get_string(key))
            .map(|dest| format!("to `{dest}`"))
            .unwrap_or_default(),
        OperationKind::Write => CONTENT_KEYS
            .iter()
            .find_map(|key| call.get_string(key))
            .map(|content| format!("{} bytes", content.len()))
            .unwrap_or_default(),
        _ => String::new(),
    };

    let list_targets: Vec<String> = PATH_LIST_KEYS
        .iter()
        .find_map(|key| call.arguments.get(*key).and_then(|v| v.as_array()))
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if !list_targets.is_empty() {
        return list_targets
            .into_iter()
            .map(|target| PlannedOperation::new(kind, Some(target)).with_detail(detail.clone()))
            .collect();
    }

    let target = primary_path_argument(call).map(|(_, path)| path.to_string());
    let operation = PlannedOperation::new(kind, target);
    let operation = if detail.is_empty() && operation.target.is_none() {
        let args = serde_json::Value::Object(call.arguments.clone());
        operation.with_detail(format!("`{}` with {}", call.name, value_preview(&args, 120)))
    } else {
        operation.with_detail(detail)
    };
    vec![operation]
}

/// Human-readable description of what a call would do.
pub fn describe_operations(operations: &[PlannedOperation]) -> String {
    match operations {
        [] => "No operations".to_string(),
        [single] => single.summary(),
        many => {
            let lines: Vec<String> = many.iter().map(|op| format!("- {}", op.summary())).collect();
            format!("{} operations:\n{}", many.len(), lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_kinds() {
        assert_eq!(OperationKind::classify("delete_note"), OperationKind::Delete);
        assert_eq!(OperationKind::classify("vault_remove_file"), OperationKind::Delete);
        assert_eq!(OperationKind::classify("rename_note"), OperationKind::Move);
        assert_eq!(OperationKind::classify("append_to_note"), OperationKind::Write);
        assert_eq!(OperationKind::classify("run_command"), OperationKind::Execute);
        assert_eq!(OperationKind::classify("summarize"), OperationKind::Other);
    }

    #[test]
    fn test_plan_single_delete() {
        let call = ToolCall::new("delete_note").with_arg("path", "notes/todo.md");
        let ops = plan_operations(&call);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Delete);
        assert_eq!(ops[0].target.as_deref(), Some("notes/todo.md"));
        assert_eq!(describe_operations(&ops), "Delete `notes/todo.md`");
    }

    #[test]
    fn test_plan_move_records_destination() {
        let call = ToolCall::new("move_note")
            .with_arg("path", "Inbox.md")
            .with_arg("destination", "archive/Inbox.md");
        let ops = plan_operations(&call);
        assert_eq!(ops[0].summary(), "Move `Inbox.md` (to `archive/Inbox.md`)");
    }

    #[test]
    fn test_plan_write_records_size() {
        let call = ToolCall::new("write_note")
            .with_arg("file", "a.md")
            .with_arg("content", "hello");
        let ops = plan_operations(&call);
        assert_eq!(ops[0].summary(), "Write `a.md` (5 bytes)");
    }

    #[test]
    fn test_plan_batch_delete() {
        let call = ToolCall::new("delete_notes").with_arg("paths", json!(["a.md", "b.md"]));
        let ops = plan_operations(&call);
        assert_eq!(ops.len(), 2);
        assert_eq!(
            describe_operations(&ops),
            "2 operations:\n- Delete `a.md`\n- Delete `b.md`"
        );
    }

    #[test]
    fn test_plan_without_target_describes_arguments() {
        let call = ToolCall::new("purge_cache").with_arg("older_than_days", 7);
        let ops = plan_operations(&call);
        assert_eq!(ops[0].target, None);
        assert_eq!(
            ops[0].summary(),
            r#"Delete (`purge_cache` with {"older_than_days":7})"#
        );
    }

    #[test]
    fn test_primary_path_argument_key_order() {
        let call = ToolCall::new("x")
            .with_arg("target", "t.md")
            .with_arg("path", "p.md");
        assert_eq!(primary_path_argument(&call), Some(("path", "p.md")));
    }
}
