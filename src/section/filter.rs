use crate::database::record::Record;

/// Filter value that shows every record
pub const ALL_FILTER: &str = "all";
pub const ALL_FILTER_LABEL: &str = "Wszystkie";

/// `"all"` followed by the distinct non-empty values of `key`, in first-seen order
pub fn filter_options(records: &[Record], key: &str) -> Vec<String> {
    let mut options = vec![ALL_FILTER.to_string()];
    for record in records {
        let value = record.text(key);
        if !value.is_empty() && !options.contains(&value) {
            options.push(value);
        }
    }
    options
}

pub fn matches_filter(record: &Record, key: &str, active: &str) -> bool {
    active == ALL_FILTER || record.text(key) == active
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_keep_first_seen_order() {
        let records: Vec<Record> = ["career", "internship", "career", ""]
            .iter()
            .map(|c| Record::from_json(json!({"category": c})).unwrap())
            .collect();
        assert_eq!(filter_options(&records, "category"), vec!["all", "career", "internship"]);
    }
}
