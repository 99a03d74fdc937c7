use serde::Serialize;
use std::fmt;

use crate::database::record::Record;
use crate::schema::ColumnProjection;

pub const EMPTY_PLACEHOLDER: &str = "Brak wpisów w tej sekcji.";

/// What the user asked the table to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    Add,
    Edit(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Row id; rows without one cannot be edited or deleted
    pub id: Option<String>,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TableBody {
    Empty { placeholder: &'static str },
    Rows { rows: Vec<TableRow> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<ColumnHeader>,
    pub body: TableBody,
}

impl TableView {
    pub fn rows(&self) -> &[TableRow] {
        match &self.body {
            TableBody::Rows { rows } => rows,
            TableBody::Empty { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.body, TableBody::Empty { .. })
    }
}

pub struct DataTable;

impl DataTable {
    /// Project records through the columns. Pure: nothing is fetched or changed.
    pub fn render(title: &str, records: &[&Record], columns: &[ColumnProjection]) -> TableView {
        let headers = columns.iter().map(|c| ColumnHeader { key: c.key, label: c.label }).collect();

        let body = if records.is_empty() {
            TableBody::Empty { placeholder: EMPTY_PLACEHOLDER }
        } else {
            TableBody::Rows {
                rows: records
                    .iter()
                    .map(|record| TableRow {
                        id: record.id(),
                        cells: columns.iter().map(|c| c.cell(record)).collect(),
                    })
                    .collect(),
            }
        };

        TableView { title: title.to_string(), columns: headers, body }
    }
}

const MAX_CELL_WIDTH: usize = 40;

fn truncate(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= MAX_CELL_WIDTH {
        single_line
    } else {
        let cut: String = single_line.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{}…", cut)
    }
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let rows = match &self.body {
            TableBody::Empty { placeholder } => return writeln!(f, "  {}", placeholder),
            TableBody::Rows { rows } => rows,
        };

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                let mut line = vec![row.id.clone().unwrap_or_default()];
                line.extend(row.cells.iter().map(|c| truncate(c)));
                line
            })
            .collect();
        let mut header = vec!["id".to_string()];
        header.extend(self.columns.iter().map(|c| c.label.to_string()));

        let widths: Vec<usize> = (0..header.len())
            .map(|i| {
                cells
                    .iter()
                    .map(|line| line[i].chars().count())
                    .chain(std::iter::once(header[i].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let write_line = |f: &mut fmt::Formatter<'_>, line: &[String]| -> fmt::Result {
            let padded: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect();
            writeln!(f, "  {}", padded.join("  ").trim_end())
        };

        write_line(f, &header)?;
        for line in &cells {
            write_line(f, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::collection;
    use serde_json::json;

    #[test]
    fn empty_input_renders_placeholder() {
        let spec = collection("faqs").unwrap();
        let view = DataTable::render(spec.title, &[], spec.columns);
        assert!(view.is_empty());
        assert_eq!(view.body, TableBody::Empty { placeholder: EMPTY_PLACEHOLDER });
        assert!(view.to_string().contains(EMPTY_PLACEHOLDER));
    }

    #[test]
    fn rows_carry_ids_and_projected_cells() {
        let spec = collection("job_offers").unwrap();
        let record = Record::from_json(json!({"id": "j1", "title": "Rust Dev", "salary": null})).unwrap();
        let view = DataTable::render(spec.title, &[&record], spec.columns);
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].id.as_deref(), Some("j1"));
        assert_eq!(view.rows()[0].cells, vec!["Rust Dev", "", ""]);
        assert_eq!(view.columns[0].label, "Stanowisko");
    }

    #[test]
    fn long_cells_are_truncated_in_text_output() {
        let long = "x".repeat(100);
        assert_eq!(truncate(&long).chars().count(), MAX_CELL_WIDTH);
        assert_eq!(truncate("a\nb"), "a b");
    }
}
