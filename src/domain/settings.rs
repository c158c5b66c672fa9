use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::KanbanError;

pub type SettingsData = Map<String, Value>;

/// Views whose saved filters are rewritten when a referenced value is renamed.
pub const FILTERED_VIEWS: [&str; 7] = ["List", "Gantt", "Kanban", "Calendar", "Image", "Inbox", "Report"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettingsKey {
    pub doctype: String,
    pub user: String,
}

impl SettingsKey {
    pub fn new(doctype: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            user: user.into(),
        }
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.doctype, self.user)
    }
}

/// Accepts a settings payload as an object or a JSON-encoded object string.
pub fn canonicalize(payload: Value) -> Result<SettingsData, KanbanError> {
    match payload {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(SettingsData::new()),
        Value::String(raw) if raw.trim().is_empty() => Ok(SettingsData::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw)
            .map_err(|e| KanbanError::Validation(format!("Invalid settings JSON: {}", e)))?
        {
            Value::Object(map) => Ok(map),
            _ => Err(KanbanError::Validation(
                "User settings must be a JSON object".into(),
            )),
        },
        _ => Err(KanbanError::Validation(
            "User settings must be a JSON object".into(),
        )),
    }
}

/// Decodes a stored row. Anything that is not an object is treated as empty.
pub fn parse_stored(raw: &str) -> SettingsData {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => SettingsData::new(),
    }
}

/// Position inside a `[doctype, docfield, operator, value]` filter tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSlot {
    Doctype,
    Docfield,
    Operator,
    Value,
}

impl FilterSlot {
    pub fn index(&self) -> usize {
        match self {
            FilterSlot::Doctype => 0,
            FilterSlot::Docfield => 1,
            FilterSlot::Operator => 2,
            FilterSlot::Value => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMatch {
    pub slot: FilterSlot,
    pub value: Value,
}

/// Rewrites saved view filters whose `slot` equals `old` to `new`. With a
/// condition, only tuples whose condition slot matches are touched.
pub fn rewrite_filters(
    data: &mut SettingsData,
    slot: FilterSlot,
    old: &Value,
    new: &Value,
    condition: Option<&FilterMatch>,
) -> bool {
    let mut changed = false;

    for view in FILTERED_VIEWS {
        let Some(filters) = data
            .get_mut(view)
            .and_then(|settings| settings.get_mut("filters"))
            .and_then(Value::as_array_mut)
        else {
            continue;
        };

        for filter in filters.iter_mut().filter_map(Value::as_array_mut) {
            if let Some(condition) = condition {
                if filter.get(condition.slot.index()) != Some(&condition.value) {
                    continue;
                }
            }
            if let Some(current) = filter.get_mut(slot.index()) {
                if *current == *old {
                    *current = new.clone();
                    changed = true;
                }
            }
        }
    }

    changed
}

/// Shallow merge, later keys win.
pub fn merge(current: &mut SettingsData, update: SettingsData) {
    for (key, value) in update {
        current.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> SettingsData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn canonicalize_accepts_object_and_string() {
        let from_obj = canonicalize(json!({"last_view": "List"})).unwrap();
        let from_str = canonicalize(json!(r#"{"last_view": "List"}"#)).unwrap();
        assert_eq!(from_obj, from_str);
        assert!(canonicalize(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn canonicalize_rejects_non_objects() {
        assert!(canonicalize(json!([1, 2])).is_err());
        assert!(canonicalize(json!("\"just a string\"")).is_err());
    }

    #[test]
    fn parse_stored_treats_corrupt_rows_as_empty() {
        assert!(parse_stored("\"{}\"").is_empty());
        assert!(parse_stored("not json").is_empty());
        assert_eq!(parse_stored(r#"{"a":1}"#).get("a"), Some(&json!(1)));
    }

    #[test]
    fn rewrite_changes_matching_values() {
        let mut settings = data(json!({
            "List": {"filters": [["Task", "project", "=", "OLD"], ["Task", "status", "=", "Open"]]},
            "Kanban": {"filters": [["Task", "project", "=", "OLD"]]},
            "GridView": {"filters": [["Task", "project", "=", "OLD"]]}
        }));

        let changed = rewrite_filters(&mut settings, FilterSlot::Value, &json!("OLD"), &json!("NEW"), None);

        assert!(changed);
        assert_eq!(settings["List"]["filters"][0][3], json!("NEW"));
        assert_eq!(settings["List"]["filters"][1][3], json!("Open"));
        assert_eq!(settings["Kanban"]["filters"][0][3], json!("NEW"));
        assert_eq!(settings["GridView"]["filters"][0][3], json!("OLD"));
    }

    #[test]
    fn rewrite_respects_condition() {
        let mut settings = data(json!({
            "List": {"filters": [["Task", "project", "=", "OLD"], ["Note", "project", "=", "OLD"]]}
        }));
        let condition = FilterMatch {
            slot: FilterSlot::Doctype,
            value: json!("Note"),
        };

        rewrite_filters(&mut settings, FilterSlot::Value, &json!("OLD"), &json!("NEW"), Some(&condition));

        assert_eq!(settings["List"]["filters"][0][3], json!("OLD"));
        assert_eq!(settings["List"]["filters"][1][3], json!("NEW"));
    }

    #[test]
    fn merge_overwrites_top_level_keys() {
        let mut current = data(json!({"last_view": "List", "List": {"sort_by": "modified"}}));
        merge(&mut current, data(json!({"last_view": "Kanban"})));
        assert_eq!(current["last_view"], json!("Kanban"));
        assert_eq!(current["List"]["sort_by"], json!("modified"));
    }
}
