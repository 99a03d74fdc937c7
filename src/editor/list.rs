use serde_json::Value;

pub const LIST_DELIMITER: char = ';';
pub const LIST_JOINER: &str = "; ";

/// Split user text into list items: trimmed, empty segments dropped
pub fn parse_list(text: &str) -> Vec<String> {
    text.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Editable text form of a list
pub fn join_list(items: &[String]) -> String {
    items.join(LIST_JOINER)
}

/// Normalize whatever a list field currently holds into a list of strings
pub fn canonicalize(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => parse_list(s),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}
