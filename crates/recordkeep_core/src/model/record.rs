//! Record model and item validation.
//!
//! # Responsibility
//! - Represent one stored record as payload fields plus metadata.
//! - Keep the flat JSON wire shape (`id`, `timestamp`, `updatedAt` next to
//!   payload keys) stable for persistence.
//!
//! # Invariants
//! - `id` and `timestamp` are immutable after construction.
//! - `updated_at` is `None` until the first successful update.
//! - `fields` never contains a reserved metadata key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier assigned to a record on insertion.
pub type RecordId = String;

/// Open-schema payload of a record, in insertion order.
pub type Fields = Map<String, Value>;

pub const ID_KEY: &str = "id";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Keys owned by the store; caller-supplied values for them are discarded.
pub const RESERVED_KEYS: [&str; 3] = [ID_KEY, TIMESTAMP_KEY, UPDATED_AT_KEY];

/// Rejection reason for malformed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Item is null, an array or a scalar instead of an object.
    NotAnObject { kind: &'static str },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject { kind } => {
                write!(f, "record item must be a JSON object, got {kind}")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    /// Creation time, epoch milliseconds.
    timestamp: i64,
    /// Last update time, epoch milliseconds.
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    updated_at: Option<i64>,
    #[serde(flatten)]
    fields: Fields,
}

impl Record {
    /// Builds a record from payload fields, dropping reserved keys.
    pub(crate) fn new(id: RecordId, timestamp: i64, mut fields: Fields) -> Self {
        strip_reserved(&mut fields);
        Self {
            id,
            timestamp,
            updated_at: None,
            fields,
        }
    }

    /// Shallow-merges `updates` over the payload and stamps `updatedAt`.
    ///
    /// `updatedAt` is clamped so it never precedes `timestamp`, which can
    /// happen when the wall clock steps backwards.
    pub(crate) fn merge(&mut self, mut updates: Fields, now_ms: i64) {
        strip_reserved(&mut updates);
        self.fields.extend(updates);
        self.updated_at = Some(now_ms.max(self.timestamp));
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    /// Payload fields without metadata.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Looks up one payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the flat wire object (payload plus metadata).
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 3);
        object.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        object.insert(TIMESTAMP_KEY.to_string(), Value::from(self.timestamp));
        if let Some(updated_at) = self.updated_at {
            object.insert(UPDATED_AT_KEY.to_string(), Value::from(updated_at));
        }
        object.extend(self.fields.clone());
        Value::Object(object)
    }
}

/// Returns whether `item` is acceptable as a record payload.
pub fn validate_item(item: &Value) -> bool {
    check_item(item).is_ok()
}

/// Same as [`validate_item`] but reports the offending kind.
pub fn check_item(item: &Value) -> Result<(), RecordValidationError> {
    match item {
        Value::Object(_) => Ok(()),
        other => Err(RecordValidationError::NotAnObject {
            kind: value_kind(other),
        }),
    }
}

/// Converts any JSON value into payload fields.
///
/// Objects are taken as-is. Arrays and strings contribute one field per
/// element keyed by position. Other scalars and `null` contribute nothing.
pub fn coerce_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        Value::String(text) => text
            .chars()
            .enumerate()
            .map(|(index, ch)| (index.to_string(), Value::String(ch.to_string())))
            .collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) => Fields::new(),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_reserved(fields: &mut Fields) {
    for key in RESERVED_KEYS {
        fields.shift_remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::{check_item, coerce_fields, validate_item, Record, RecordValidationError};
    use serde_json::json;

    fn fields(value: serde_json::Value) -> super::Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn validate_item_accepts_objects_only() {
        assert!(validate_item(&json!({})));
        assert!(validate_item(&json!({"a": 1})));
        assert!(!validate_item(&json!(null)));
        assert!(!validate_item(&json!([1, 2])));
        assert!(!validate_item(&json!("text")));
        assert!(!validate_item(&json!(42)));
    }

    #[test]
    fn check_item_reports_offending_kind() {
        assert_eq!(
            check_item(&json!([])).unwrap_err(),
            RecordValidationError::NotAnObject { kind: "array" }
        );
        assert_eq!(
            check_item(&json!(null)).unwrap_err(),
            RecordValidationError::NotAnObject { kind: "null" }
        );
    }

    #[test]
    fn coerce_fields_spreads_arrays_and_strings_by_index() {
        let from_array = coerce_fields(json!(["x", 2]));
        assert_eq!(from_array.get("0"), Some(&json!("x")));
        assert_eq!(from_array.get("1"), Some(&json!(2)));

        let from_string = coerce_fields(json!("hi"));
        assert_eq!(from_string.get("0"), Some(&json!("h")));
        assert_eq!(from_string.get("1"), Some(&json!("i")));

        assert!(coerce_fields(json!(null)).is_empty());
        assert!(coerce_fields(json!(7)).is_empty());
    }

    #[test]
    fn new_drops_reserved_keys_from_payload() {
        let record = Record::new(
            "r-1".to_string(),
            100,
            fields(json!({"id": "spoofed", "timestamp": 1, "updatedAt": 2, "name": "a"})),
        );

        assert_eq!(record.id(), "r-1");
        assert_eq!(record.timestamp(), 100);
        assert_eq!(record.updated_at(), None);
        assert_eq!(record.fields().len(), 1);
        assert_eq!(record.get("name"), Some(&json!("a")));
    }

    #[test]
    fn merge_overwrites_payload_and_keeps_metadata() {
        let mut record = Record::new("r-1".to_string(), 100, fields(json!({"a": 1, "b": 2})));

        record.merge(fields(json!({"b": 3, "c": 4, "id": "other"})), 50);

        assert_eq!(record.id(), "r-1");
        assert_eq!(record.get("a"), Some(&json!(1)));
        assert_eq!(record.get("b"), Some(&json!(3)));
        assert_eq!(record.get("c"), Some(&json!(4)));
        assert_eq!(record.updated_at(), Some(100));
    }

    #[test]
    fn serialization_uses_flat_wire_shape() {
        let mut record = Record::new("r-1".to_string(), 100, fields(json!({"tag": "x"})));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"id": "r-1", "timestamp": 100, "tag": "x"}));
        assert_eq!(json, record.to_value());

        record.merge(fields(json!({"tag": "y"})), 200);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["updatedAt"], 200);

        let decoded: Record = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn deserialize_requires_metadata() {
        let err = serde_json::from_value::<Record>(json!({"tag": "x", "timestamp": 1}));
        assert!(err.is_err());
    }
}
