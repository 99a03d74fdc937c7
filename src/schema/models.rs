//! Typed shapes of every content collection.
//!
//! Drafts are validated against these before they are written, so a draft
//! that passed the form but does not fit its table never reaches the backend.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::database::record::{Record, RecordError};

/// Numeric input as typed: a JSON number or a string holding one
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericText(pub f64);

impl<'de> Deserialize<'de> for NumericText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .map(NumericText)
                .ok_or_else(|| de::Error::custom("number out of range")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(NumericText)
                .map_err(|_| de::Error::custom(format!("'{}' is not a number", s))),
            other => Err(de::Error::custom(format!("expected a number, got {}", other))),
        }
    }
}

/// Treat a missing, null or empty-string value as `None`
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: de::DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaqCategory {
    Career,
    Internship,
    Practices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineCategory {
    Recruitment,
    Internship,
    Practices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Deserialize)]
pub struct JobOffer {
    pub title: String,
    pub salary: String,
    pub location: String,
    pub contract: String,
    pub description: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub responsibilities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
    pub category: FaqCategory,
}

#[derive(Debug, Deserialize)]
pub struct Testimonial {
    pub name: String,
    pub role: String,
    pub quote: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyValue {
    pub title: String,
    pub description: String,
    pub display_order: NumericText,
}

#[derive(Debug, Deserialize)]
pub struct InternshipPath {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub description: String,
    #[serde(default)]
    pub icon_name: Option<String>,
    #[serde(default)]
    pub learn_list: Option<Vec<String>>,
    #[serde(default)]
    pub stack_list: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineEvent {
    pub date_display: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TimelineCategory,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub align: Option<Align>,
}

#[derive(Debug, Deserialize)]
pub struct Video {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyStat {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    pub display_order: NumericText,
}

#[derive(Debug, Deserialize)]
pub struct GrowthPoint {
    pub year: String,
    pub count: NumericText,
}

#[derive(Debug, Deserialize)]
pub struct Memory {
    pub year: String,
    pub label: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct InternshipProject {
    pub year: String,
    pub title: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub tools: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgramGoal {
    pub title: String,
    pub value: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub display_order: NumericText,
}

#[derive(Debug, Deserialize)]
pub struct InternshipRule {
    pub rule: String,
    pub display_order: NumericText,
}

/// Check that a record deserializes into `T`
pub fn validate_as<T: de::DeserializeOwned>(record: &Record) -> Result<(), RecordError> {
    serde_json::from_value::<T>(record.to_json())
        .map(|_| ())
        .map_err(|e| RecordError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_text_accepts_numbers_and_numeric_strings() {
        let record = Record::from_json(json!({"title": "T", "description": "D", "display_order": "4"})).unwrap();
        assert!(validate_as::<CompanyValue>(&record).is_ok());

        let record = Record::from_json(json!({"title": "T", "description": "D", "display_order": 4})).unwrap();
        assert!(validate_as::<CompanyValue>(&record).is_ok());

        let record = Record::from_json(json!({"title": "T", "description": "D", "display_order": "four"})).unwrap();
        assert!(matches!(validate_as::<CompanyValue>(&record), Err(RecordError::Shape(_))));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let record = Record::from_json(json!({"question": "Q", "answer": "A", "category": "sales"})).unwrap();
        assert!(validate_as::<Faq>(&record).is_err());
    }

    #[test]
    fn empty_align_reads_as_none() {
        let record = Record::from_json(json!({
            "date_display": "2024", "title": "T", "category": "practices", "align": ""
        }))
        .unwrap();
        assert!(validate_as::<TimelineEvent>(&record).is_ok());
    }

    #[test]
    fn system_fields_are_tolerated() {
        let record = Record::from_json(json!({
            "id": "abc", "created_at": "2024-01-01T00:00:00Z", "title": "T", "url": "https://youtu.be/x"
        }))
        .unwrap();
        assert!(validate_as::<Video>(&record).is_ok());
    }
}
