//! Atlassian Document Format flattening and acceptance-criteria lookup.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Plain text for a Jira description field.
///
/// ADF objects are flattened, plain strings pass through, null is empty.
pub fn description_text(description: Option<&Value>) -> String {
    match description {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => adf_to_text(other),
    }
}

/// Flatten one ADF node.
///
/// Container nodes recurse and join their non-empty children with newlines;
/// a paragraph joins its `text` children with single spaces; unknown node
/// types contribute nothing.
pub fn adf_to_text(node: &Value) -> String {
    let Some(obj) = node.as_object() else {
        return match node {
            Value::String(s) => s.clone(),
            _ => String::new(),
        };
    };

    let children = || {
        obj.get("content")
            .and_then(Value::as_array)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    };

    match obj.get("type").and_then(Value::as_str).unwrap_or_default() {
        "doc" | "heading" | "bulletList" | "orderedList" | "listItem" => children()
            .iter()
            .map(adf_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        "paragraph" => children()
            .iter()
            .filter(|c| c.get("type").and_then(Value::as_str) == Some("text"))
            .map(|c| c.get("text").and_then(Value::as_str).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" "),
        "text" => obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn criteria_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?is)acceptance criteria:?[ \t]*\n(.+?)(?:\n[ \t]*\n|\z)",
            r"(?is)\bAC:?[ \t]*\n(.+?)(?:\n[ \t]*\n|\z)",
            r"(?is)\bcriteria:?[ \t]*\n(.+?)(?:\n[ \t]*\n|\z)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("acceptance criteria pattern is valid"))
        .collect()
    })
}

/// Acceptance criteria under the first matching heading, up to the next blank
/// line. Empty when no heading is present.
pub fn extract_acceptance_criteria(text: &str) -> String {
    criteria_patterns()
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
