use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Columns owned by the backend. Never written on update.
pub const SYSTEM_FIELDS: &[&str] = &["id", "created_at"];

pub fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.iter().any(|f| *f == name)
}

/// Errors that can occur while building or validating a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("Field '{0}' is not part of this form")]
    UnknownField(String),
    #[error("Field '{0}' cannot be edited as text")]
    NotTextField(String),
    #[error("Invalid option for field '{field}': {value}")]
    InvalidOption { field: String, value: String },
    #[error("Field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: String, value: String },
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
    #[error("Record does not match its collection: {0}")]
    Shape(String),
}

impl RecordError {
    /// Field the error refers to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            RecordError::MissingRequiredField(field)
            | RecordError::UnknownField(field)
            | RecordError::NotTextField(field) => Some(field),
            RecordError::InvalidOption { field, .. }
            | RecordError::InvalidNumber { field, .. }
            | RecordError::InvalidValue { field, .. } => Some(field),
            RecordError::InvalidJson(_) | RecordError::Shape(_) => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            RecordError::MissingRequiredField(field) => format!("Field '{}' is required.", field),
            RecordError::InvalidOption { field, value } => {
                format!("'{}' is not an allowed choice for '{}'.", value, field)
            }
            other => other.to_string(),
        }
    }
}

/// A schema-described row: field name -> JSON value.
///
/// Drafts are records too. Whether a draft carries a non-empty `id` is the only
/// thing that decides between insert and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Create record from a JSON object
    pub fn from_json(json: Value) -> Result<Self, RecordError> {
        match json {
            Value::Object(map) => Ok(Self { fields: map }),
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Get field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set field value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Remove field and return its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // ========================================
    // Standard field accessors
    // ========================================

    /// Record id, if present and non-empty
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Get created_at timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Display text of a field; missing and null render as an empty string
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(value_text).unwrap_or_default()
    }

    /// True when the field is missing, null, blank text or an empty list
    pub fn is_blank(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    /// Validate that required fields are present and not blank
    pub fn validate_required_fields(&self, fields: &[&str]) -> Result<(), RecordError> {
        for &field in fields {
            if self.is_blank(field) {
                return Err(RecordError::MissingRequiredField(field.to_string()));
            }
        }
        Ok(())
    }

    /// Columns of a new row: a caller-supplied id is kept (team rows are keyed by
    /// the auth user id), a blank id and `created_at` are left to the database
    pub fn insertable_fields(&self) -> Map<String, Value> {
        let mut fields = self.writable_fields();
        if let Some(id) = self.get("id").filter(|_| self.id().is_some()) {
            fields.insert("id".to_string(), id.clone());
        }
        fields
    }

    /// Fields an update may change (system fields stripped)
    pub fn writable_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(k, _)| !is_system_field(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // ========================================
    // Serialization
    // ========================================

    /// Convert to JSON Value (all fields)
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Plain-text rendering of a JSON value as shown in lists and filters
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

// ========================================
// Conversions
// ========================================

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.fields)
    }
}

impl serde::Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Record(id: {:?}, fields: {})", self.id(), self.fields.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_requires_non_empty_value() {
        let record = Record::from_json(json!({"id": "  "})).unwrap();
        assert_eq!(record.id(), None);

        let record = Record::from_json(json!({"id": "abc"})).unwrap();
        assert_eq!(record.id().as_deref(), Some("abc"));

        let record = Record::from_json(json!({"id": 7})).unwrap();
        assert_eq!(record.id().as_deref(), Some("7"));
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(matches!(Record::from_json(json!([1, 2])), Err(RecordError::InvalidJson(_))));
    }

    #[test]
    fn blank_covers_missing_null_whitespace_and_empty_lists() {
        let record = Record::from_json(json!({"a": null, "b": "  ", "c": [], "d": "x", "e": 0})).unwrap();
        assert!(record.is_blank("a"));
        assert!(record.is_blank("b"));
        assert!(record.is_blank("c"));
        assert!(record.is_blank("missing"));
        assert!(!record.is_blank("d"));
        assert!(!record.is_blank("e"));
        assert_eq!(
            record.validate_required_fields(&["d", "b"]),
            Err(RecordError::MissingRequiredField("b".to_string()))
        );
    }

    #[test]
    fn writable_fields_strip_system_columns() {
        let record = Record::from_json(json!({"id": "1", "created_at": "2024-01-01T00:00:00Z", "title": "x"})).unwrap();
        let writable = record.writable_fields();
        assert_eq!(writable.len(), 1);
        assert!(writable.contains_key("title"));
        assert!(record.created_at().is_some());
    }

    #[test]
    fn insertable_fields_keep_a_supplied_id() {
        let record = Record::from_json(json!({"id": "user-uuid", "role": "editor", "created_at": "x"})).unwrap();
        let fields = record.insertable_fields();
        assert_eq!(fields.get("id"), Some(&json!("user-uuid")));
        assert_eq!(fields.get("role"), Some(&json!("editor")));
        assert!(!fields.contains_key("created_at"));

        let blank = Record::from_json(json!({"id": " ", "title": "x"})).unwrap();
        assert!(!blank.insertable_fields().contains_key("id"));
    }

    #[test]
    fn value_text_renders_lists_and_nulls() {
        assert_eq!(value_text(&json!(["a", "b"])), "a, b");
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!(4)), "4");
    }
}
