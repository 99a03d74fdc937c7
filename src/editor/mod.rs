//! Form editor that builds a draft record from a field schema.
//!
//! The editor never talks to the data store. It accumulates edits in its
//! draft and hands the whole draft back from [`GenericEditor::submit`]; only
//! image uploads leave the process, through the [`BlobStore`].

pub mod list;
pub mod upload;
pub mod view;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::database::record::{value_text, Record, RecordError};
use crate::schema::{FieldDescriptor, FieldKind};
use crate::store::BlobStore;

pub use list::{join_list, parse_list, LIST_DELIMITER, LIST_JOINER};
pub use upload::{upload_image_file, UploadError, UploadFile, UploadPolicy};
pub use view::{FieldView, FormView, SELECT_PLACEHOLDER};

#[derive(Debug, Clone)]
pub struct GenericEditor {
    fields: &'static [FieldDescriptor],
    draft: Record,
    field_errors: BTreeMap<String, String>,
    form_error: Option<String>,
}

impl GenericEditor {
    /// Start editing. An empty record means a new entry.
    pub fn new(initial: Record, fields: &'static [FieldDescriptor]) -> Self {
        Self { fields, draft: initial, field_errors: BTreeMap::new(), form_error: None }
    }

    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    /// True when saving will insert rather than update
    pub fn is_new(&self) -> bool {
        self.draft.id().is_none()
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Form-level message shown above the fields, e.g. a failed save
    pub fn set_form_error(&mut self, message: Option<String>) {
        self.form_error = message;
    }

    fn descriptor(&self, key: &str) -> Result<&'static FieldDescriptor, RecordError> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| RecordError::UnknownField(key.to_string()))
    }

    fn check_option(field: &FieldDescriptor, value: &str) -> Result<(), RecordError> {
        if value.is_empty() || field.allows_option(value) {
            Ok(())
        } else {
            Err(RecordError::InvalidOption { field: field.key.to_string(), value: value.to_string() })
        }
    }

    /// Apply typed text to a field, the way a form input would
    pub fn set_text(&mut self, key: &str, text: &str) -> Result<(), RecordError> {
        let field = self.descriptor(key)?;
        let value = match field.kind {
            FieldKind::ImageReference => return Err(RecordError::NotTextField(key.to_string())),
            FieldKind::DelimitedList | FieldKind::TagList => {
                Value::Array(parse_list(text).into_iter().map(Value::String).collect())
            }
            FieldKind::SingleSelect => {
                let choice = text.trim();
                Self::check_option(field, choice)?;
                Value::String(choice.to_string())
            }
            FieldKind::ShortText | FieldKind::LongText | FieldKind::Numeric => Value::String(text.to_string()),
        };
        self.draft.set(key, value);
        self.field_errors.remove(key);
        Ok(())
    }

    /// Apply a structured value, e.g. one field of a JSON payload
    pub fn set_value(&mut self, key: &str, value: Value) -> Result<(), RecordError> {
        let field = self.descriptor(key)?;
        let value = match (field.kind, value) {
            (FieldKind::DelimitedList | FieldKind::TagList, value) => {
                Value::Array(list::canonicalize(&value).into_iter().map(Value::String).collect())
            }
            (FieldKind::SingleSelect, Value::Null) => Value::String(String::new()),
            (FieldKind::SingleSelect, Value::String(choice)) => {
                Self::check_option(field, choice.trim())?;
                Value::String(choice.trim().to_string())
            }
            (FieldKind::SingleSelect, other) => {
                return Err(RecordError::InvalidOption { field: key.to_string(), value: other.to_string() })
            }
            (FieldKind::ImageReference, Value::Null) => Value::String(String::new()),
            (FieldKind::ImageReference, Value::String(url)) => Value::String(url),
            (FieldKind::ImageReference, other) => {
                return Err(RecordError::InvalidValue {
                    field: key.to_string(),
                    message: format!("expected an image URL, got {}", other),
                })
            }
            (_, Value::Null) => Value::String(String::new()),
            (_, Value::String(text)) => Value::String(text),
            (_, other) => Value::String(value_text(&other)),
        };
        self.draft.set(key, value);
        self.field_errors.remove(key);
        Ok(())
    }

    /// Current text of a field as the form shows it
    pub fn text(&self, key: &str) -> String {
        let value = self.draft.get(key).unwrap_or(&Value::Null);
        match self.fields.iter().find(|f| f.key == key).map(|f| f.kind) {
            Some(kind) if kind.is_list() => join_list(&list::canonicalize(value)),
            _ => value_text(value),
        }
    }

    /// Upload an image and store its public URL in the field.
    /// On failure the field keeps its previous value and shows the error inline.
    pub async fn upload_image(
        &mut self,
        key: &str,
        file: &UploadFile,
        blobs: &dyn BlobStore,
        policy: &UploadPolicy,
    ) -> Result<(), UploadError> {
        let field = self.descriptor(key).map_err(|_| UploadError::NotImageField(key.to_string()))?;
        if field.kind != FieldKind::ImageReference {
            return Err(UploadError::NotImageField(key.to_string()));
        }

        match upload_image_file(blobs, policy, file).await {
            Ok(url) => {
                self.draft.set(key, url);
                self.field_errors.remove(key);
                Ok(())
            }
            Err(e) => {
                warn!("Upload for field {} failed: {}", key, e);
                self.field_errors.insert(key.to_string(), e.user_message());
                Err(e)
            }
        }
    }

    pub fn clear_image(&mut self, key: &str) -> Result<(), RecordError> {
        let field = self.descriptor(key)?;
        if field.kind != FieldKind::ImageReference {
            return Err(RecordError::InvalidValue {
                field: key.to_string(),
                message: "not an image field".to_string(),
            });
        }
        self.draft.set(key, "");
        self.field_errors.remove(key);
        Ok(())
    }

    pub fn render(&self) -> FormView {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let text = self.text(field.key);
                let placeholder = match field.kind {
                    FieldKind::SingleSelect => field.placeholder.or(Some(SELECT_PLACEHOLDER)),
                    _ => field.placeholder,
                };
                FieldView {
                    key: field.key,
                    label: field.label,
                    kind: field.kind,
                    text,
                    options: field.options.to_vec(),
                    placeholder,
                    required: field.required,
                    error: self.field_errors.get(field.key).cloned(),
                }
            })
            .collect();

        FormView {
            title: if self.is_new() { "Dodaj" } else { "Edytuj" },
            fields,
            error: self.form_error.clone(),
        }
    }

    fn check_field(&self, field: &FieldDescriptor) -> Result<(), RecordError> {
        if field.required && self.draft.is_blank(field.key) {
            return Err(RecordError::MissingRequiredField(field.key.to_string()));
        }
        match field.kind {
            FieldKind::SingleSelect => Self::check_option(field, self.text(field.key).trim()),
            FieldKind::Numeric => {
                let text = self.text(field.key);
                if text.trim().is_empty() || text.trim().parse::<f64>().is_ok() {
                    Ok(())
                } else {
                    Err(RecordError::InvalidNumber { field: field.key.to_string(), value: text })
                }
            }
            _ => Ok(()),
        }
    }

    /// Validate the draft and return all of it (not a diff).
    /// Every failing field gets an inline error; the first failure is returned.
    pub fn submit(&mut self) -> Result<Record, RecordError> {
        let mut first = None;
        for field in self.fields {
            if let Err(e) = self.check_field(field) {
                self.field_errors.insert(field.key.to_string(), e.user_message());
                first.get_or_insert(e);
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(self.draft.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{FAQS_FIELDS, JOBS_FIELDS, MEMORIES_FIELDS, VALUES_FIELDS};
    use crate::testing::{FailOn, MemoryStore};
    use serde_json::json;

    #[test]
    fn list_fields_reparse_on_every_edit() {
        let mut editor = GenericEditor::new(Record::new(), JOBS_FIELDS);
        editor.set_text("tags", "A; B ;  ;C").unwrap();
        assert_eq!(editor.draft().get("tags"), Some(&json!(["A", "B", "C"])));
        assert_eq!(editor.text("tags"), "A; B; C");

        let shown = editor.text("tags");
        editor.set_text("tags", &shown).unwrap();
        assert_eq!(editor.draft().get("tags"), Some(&json!(["A", "B", "C"])));
    }

    #[test]
    fn numeric_fields_stay_raw_text() {
        let mut editor = GenericEditor::new(Record::new(), VALUES_FIELDS);
        editor.set_text("display_order", "4").unwrap();
        assert_eq!(editor.draft().get("display_order"), Some(&json!("4")));
    }

    #[test]
    fn select_rejects_unknown_options_and_shows_placeholder() {
        let mut editor = GenericEditor::new(Record::new(), FAQS_FIELDS);
        let err = editor.set_text("category", "sales").unwrap_err();
        assert!(matches!(err, RecordError::InvalidOption { .. }));

        let view = editor.render();
        let category = view.fields.iter().find(|f| f.key == "category").unwrap();
        assert_eq!(category.text, "");
        assert_eq!(category.placeholder, Some(SELECT_PLACEHOLDER));
        assert_eq!(category.options, vec!["career", "internship", "practices"]);
    }

    #[test]
    fn submit_reports_missing_required_fields_inline() {
        let mut editor = GenericEditor::new(Record::new(), FAQS_FIELDS);
        editor.set_text("question", "Q?").unwrap();
        let err = editor.submit().unwrap_err();
        assert_eq!(err, RecordError::MissingRequiredField("answer".to_string()));
        assert!(editor.field_errors().contains_key("answer"));
        assert!(editor.field_errors().contains_key("category"));

        editor.set_text("answer", "A").unwrap();
        editor.set_text("category", "career").unwrap();
        let draft = editor.submit().unwrap();
        assert_eq!(draft.text("category"), "career");
        assert!(editor.field_errors().is_empty());
    }

    #[test]
    fn submit_rejects_non_numeric_text() {
        let mut editor = GenericEditor::new(Record::new(), VALUES_FIELDS);
        editor.set_text("title", "T").unwrap();
        editor.set_text("description", "D").unwrap();
        editor.set_text("display_order", "first").unwrap();
        assert!(matches!(editor.submit(), Err(RecordError::InvalidNumber { .. })));
    }

    #[test]
    fn submit_returns_the_whole_draft() {
        let initial = Record::from_json(json!({
            "id": "v1", "created_at": "2024-01-01T00:00:00Z",
            "title": "Old", "description": "D", "display_order": 1
        }))
        .unwrap();
        let mut editor = GenericEditor::new(initial, VALUES_FIELDS);
        assert!(!editor.is_new());
        assert_eq!(editor.render().title, "Edytuj");

        editor.set_text("title", "New").unwrap();
        let draft = editor.submit().unwrap();
        assert_eq!(draft.id().as_deref(), Some("v1"));
        assert_eq!(draft.text("description"), "D");
        assert_eq!(draft.text("title"), "New");
    }

    #[test]
    fn image_fields_are_not_text() {
        let mut editor = GenericEditor::new(Record::new(), MEMORIES_FIELDS);
        assert!(matches!(editor.set_text("image_url", "x"), Err(RecordError::NotTextField(_))));
        assert!(matches!(editor.set_text("nope", "x"), Err(RecordError::UnknownField(_))));
    }

    #[tokio::test]
    async fn upload_sets_url_and_failure_keeps_previous_value() {
        let store = MemoryStore::new();
        let policy = UploadPolicy::default();
        let mut editor = GenericEditor::new(Record::new(), MEMORIES_FIELDS);

        editor
            .upload_image("image_url", &UploadFile::new("a.png", vec![1]), &store, &policy)
            .await
            .unwrap();
        let uploaded = editor.text("image_url");
        assert!(uploaded.starts_with("memory://images/"));

        store.fail_on(FailOn::Upload);
        let err = editor
            .upload_image("image_url", &UploadFile::new("b.png", vec![1]), &store, &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Store(_)));
        assert_eq!(editor.text("image_url"), uploaded);
        assert!(editor.render().fields[2].error.is_some());

        editor.clear_image("image_url").unwrap();
        assert_eq!(editor.text("image_url"), "");
    }
}
