use serde::Serialize;
use std::fmt;

use crate::schema::FieldKind;

pub const SELECT_PLACEHOLDER: &str = "Wybierz...";

/// Renderable state of the editor form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub title: &'static str,
    pub fields: Vec<FieldView>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Current textual value; lists are joined with "; "
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        for field in &self.fields {
            let marker = if field.required { "*" } else { "" };
            let shown = match (&field.text, field.placeholder) {
                (text, Some(placeholder)) if text.is_empty() => format!("({})", placeholder),
                (text, _) => text.clone(),
            };
            write!(f, "{}{} [{}]: {}", field.label, marker, field.key, shown)?;
            if !field.options.is_empty() {
                write!(f, "  options: {}", field.options.join(" | "))?;
            }
            if let Some(error) = &field.error {
                write!(f, "  ! {}", error)?;
            }
            writeln!(f)?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "! {}", error)?;
        }
        Ok(())
    }
}
