use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::StoreError;
use crate::database::record::{value_text, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Column + direction. Collections without an explicit order use `created_at` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self { column, direction: SortDirection::Asc }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self { column, direction: SortDirection::Desc }
    }

    pub const fn created_at() -> Self {
        Self::asc("created_at")
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::created_at()
    }
}

/// Equality condition on one column
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

/// Read request against a collection: equality filters plus a single ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub order: Option<(String, SortDirection)>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self { conditions: Vec::new(), order: None }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition { column: column.into(), value: value.into() });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some((order.column.to_string(), order.direction));
        self
    }

    /// Reject anything that is not a plain identifier before it reaches SQL
    pub fn validate(&self) -> Result<(), StoreError> {
        for condition in &self.conditions {
            validate_identifier(&condition.column)?;
        }
        if let Some((column, _)) = &self.order {
            validate_identifier(column)?;
        }
        Ok(())
    }

    /// In-memory evaluation of the equality filters
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| {
            record
                .get(&c.column)
                .map(|v| v == &c.value || value_text(v) == value_text(&c.value))
                .unwrap_or(false)
        })
    }

    /// Sort records in place following the query order
    pub fn sort(&self, records: &mut [Record]) {
        let Some((column, direction)) = &self.order else {
            return;
        };
        records.sort_by(|a, b| {
            let ordering = compare_values(a.get(column), b.get(column));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// `WHERE ... ORDER BY ...` fragment with `$n` placeholders starting at 1.
    /// Values are bound as text and compared against the column's text form.
    pub fn to_sql(&self, alias: &str) -> Result<(String, Vec<String>), StoreError> {
        self.validate()?;
        let mut sql = String::new();
        let mut params = Vec::with_capacity(self.conditions.len());

        for (i, condition) in self.conditions.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("{}.{}::text = ${}", alias, quote_identifier(&condition.column), i + 1));
            params.push(value_text(&condition.value));
        }

        if let Some((column, direction)) = &self.order {
            sql.push_str(&format!(" ORDER BY {}.{} {}", alias, quote_identifier(column), direction.to_sql()));
        }

        Ok((sql, params))
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Identifiers are lowercase snake_case: letters, digits, underscores, leading letter or underscore
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_start && valid_rest && name.len() <= 63 {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
