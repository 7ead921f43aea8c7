use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable identity of a record. JSON ids may be numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Int(i64::from(n))
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

/// Marks a record synthesized by grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHeader {
    /// Field the store is grouped by
    pub field: String,
    /// Shared value of the group's children
    pub value: Value,
    /// Number of child records in the group
    pub child_count: usize,
}

/// An identity-bearing item in a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    /// Field values keyed by field name
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Per-record height hint, overrides the configured row height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_height: Option<f64>,
    /// Present on group header rows only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_header: Option<GroupHeader>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            data: Map::new(),
            row_height: None,
            group_header: None,
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.data.insert(field.to_string(), value.into());
        self
    }

    /// Builder-style height hint.
    #[must_use]
    pub fn with_row_height(mut self, height: f64) -> Self {
        self.row_height = Some(height);
        self
    }

    /// Raw value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Group headers and other synthesized rows.
    pub fn is_special(&self) -> bool {
        self.group_header.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_untagged() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"[1, "a-2"]"#).unwrap();
        assert_eq!(ids, vec![RecordId::Int(1), RecordId::Str("a-2".to_string())]);
        assert_eq!(ids[1].to_string(), "a-2");
    }

    #[test]
    fn test_record_deserialize_defaults() {
        let rec: Record = serde_json::from_str(r#"{"id": 7, "data": {"name": "x"}}"#).unwrap();
        assert_eq!(rec.id, RecordId::Int(7));
        assert_eq!(rec.get("name"), Some(&Value::from("x")));
        assert!(rec.row_height.is_none());
        assert!(!rec.is_special());
    }
}
