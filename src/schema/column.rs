use serde::Serialize;
use serde_json::Value;

use crate::database::record::{value_text, Record};

/// Custom cell renderer: the cell's value plus the whole row
pub type CellRenderer = fn(&Value, &Record) -> String;

/// One table column: which field it shows and how
#[derive(Clone, Copy, Serialize)]
pub struct ColumnProjection {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip)]
    pub render: Option<CellRenderer>,
}

impl ColumnProjection {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label, render: None }
    }

    pub const fn rendered(key: &'static str, label: &'static str, render: CellRenderer) -> Self {
        Self { key, label, render: Some(render) }
    }

    /// Text of this column for one record; missing or null values render empty
    pub fn cell(&self, record: &Record) -> String {
        let value = record.get(self.key).unwrap_or(&Value::Null);
        match self.render {
            Some(render) => render(value, record),
            None => value_text(value),
        }
    }
}

impl std::fmt::Debug for ColumnProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnProjection")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("render", &self.render.is_some())
            .finish()
    }
}

impl PartialEq for ColumnProjection {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.label == other.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shout(value: &Value, _record: &Record) -> String {
        value_text(value).to_uppercase()
    }

    #[test]
    fn renders_plain_text_or_override() {
        let record = Record::from_json(json!({"title": "Rust dev", "tags": ["a", "b"], "x": null})).unwrap();
        assert_eq!(ColumnProjection::new("title", "T").cell(&record), "Rust dev");
        assert_eq!(ColumnProjection::new("tags", "T").cell(&record), "a, b");
        assert_eq!(ColumnProjection::new("x", "X").cell(&record), "");
        assert_eq!(ColumnProjection::new("missing", "M").cell(&record), "");
        assert_eq!(ColumnProjection::rendered("title", "T", shout).cell(&record), "RUST DEV");
    }
}
