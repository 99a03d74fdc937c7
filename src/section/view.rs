use serde::Serialize;
use std::fmt;

use crate::editor::FormView;
use crate::table::TableView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Blocking message the user has to acknowledge, e.g. a failed save
    Alert,
    /// Passive status line, e.g. a failed load
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn alert(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Alert, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteConfirmation {
    pub id: Option<String>,
    pub message: String,
}

/// Everything needed to draw one admin section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub collection: &'static str,
    pub title: &'static str,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterOption>,
    pub table: TableView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<FormView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<DeleteConfirmation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl fmt::Display for SectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(notice) = &self.notice {
            writeln!(f, "[{:?}] {}", notice.level, notice.message)?;
        }
        if !self.filters.is_empty() {
            let labels: Vec<String> = self
                .filters
                .iter()
                .map(|o| if o.active { format!("[{}]", o.label) } else { o.label.clone() })
                .collect();
            writeln!(f, "Filter: {}", labels.join(" "))?;
        }
        write!(f, "{}", self.table)?;
        if let Some(editor) = &self.editor {
            write!(f, "{}", editor)?;
        }
        if let Some(confirm) = &self.confirm {
            writeln!(f, "{}", confirm.message)?;
        }
        Ok(())
    }
}
