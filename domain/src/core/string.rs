//! String utilities for the domain layer.

const ELLIPSIS: &str = "...";

/// Shorten `s` to at most `max_len` bytes, ending the cut text with `...`.
/// The cut always lands on a character boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let budget = max_len.saturating_sub(ELLIPSIS.len());
    let cut = s
        .char_indices()
        .map(|(start, _)| start)
        .take_while(|&start| start <= budget)
        .last()
        .unwrap_or(0);
    format!("{}{ELLIPSIS}", &s[..cut])
}

/// Render a JSON value as a compact single-line preview.
///
/// Strings are shown without surrounding quotes so that argument previews
/// read naturally in card titles ("delete notes/todo.md").
pub fn value_preview(value: &serde_json::Value, max_len: usize) -> String {
    let raw = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&raw, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_paths_are_untouched() {
        assert_eq!(truncate("inbox/today.md", 14), "inbox/today.md");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_long_path_keeps_prefix() {
        assert_eq!(truncate("archive/2024/review.md", 12), "archive/2...");
        assert_eq!(truncate("archive", 2), "...");
    }

    #[test]
    fn test_cut_never_splits_a_character() {
        // "✅" is three bytes: 8 minus the ellipsis leaves room for one.
        assert_eq!(truncate("✅✅✅ done", 8), "✅...");
        assert_eq!(truncate("✅✅✅ done", 9), "✅✅...");
    }

    #[test]
    fn test_value_preview_unquotes_strings() {
        assert_eq!(value_preview(&json!("notes/todo.md"), 40), "notes/todo.md");
        assert_eq!(value_preview(&json!({"a": 1}), 40), r#"{"a":1}"#);
        assert_eq!(value_preview(&json!("abcdefghij"), 8), "abcde...");
    }
}
