//! Field merge policy shared by the deserializer and the resolver.
//!
//! A field holds nothing, a single value, or an array. Adding to a single
//! value promotes it to a two-element array. Duplicate suppression uses
//! partial deep matching: an existing value "contains" a new item when every
//! member of the item is present with a matching value.

use serde_json::Value;

use crate::types::{DeserializedData, Record, RecordId};

/// How a value is merged into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    /// Append even when a matching value is already present.
    pub allow_duplicates: bool,
    /// Start with `[item]` instead of a bare `item`.
    pub force_array: bool,
}

impl FieldPolicy {
    /// Policy for relationship fields of a record.
    pub fn relationship(force_array: bool) -> Self {
        Self {
            allow_duplicates: true,
            force_array,
        }
    }

    /// Policy for top-level stub accumulation.
    pub fn unique() -> Self {
        Self {
            allow_duplicates: false,
            force_array: false,
        }
    }
}

/// Merge `item` into an existing field value.
///
/// A `null`, `false`, `0` or `""` field counts as absent and is replaced.
pub fn add_to_field(field: Option<Value>, item: Value, policy: FieldPolicy) -> Value {
    match field {
        Some(existing) if !is_absent(&existing) => match existing {
            Value::Array(mut items) => {
                if policy.allow_duplicates || !items.iter().any(|existing| is_match(existing, &item)) {
                    items.push(item);
                }
                Value::Array(items)
            }
            existing => {
                if policy.allow_duplicates || !is_match(&existing, &item) {
                    Value::Array(vec![existing, item])
                } else {
                    existing
                }
            }
        },
        _ => {
            if policy.force_array {
                Value::Array(vec![item])
            } else {
                item
            }
        }
    }
}

/// Merge `item` into `record[field]`, keeping the field's position.
pub fn add_to_record_field(record: &mut Record, field: &str, item: Value, policy: FieldPolicy) {
    let slot = record.entry(field).or_insert(Value::Null);
    let existing = std::mem::take(slot);
    *slot = add_to_field(Some(existing), item, policy);
}

/// Add a record to the output under `type_name`.
///
/// Returns `None` when duplicates are disallowed and a matching record of the
/// type already exists.
pub fn add_to_output(
    output: &mut DeserializedData,
    type_name: &str,
    record: Record,
    policy: FieldPolicy,
) -> Option<RecordId> {
    if !policy.allow_duplicates && contains_match(output, output.ids(type_name), &record) {
        return None;
    }
    Some(output.push(type_name, record))
}

/// Like [`add_to_output`], but only `candidates` are checked for duplicates.
///
/// Callers that index records by id pass the records sharing the new
/// record's id.
pub(crate) fn add_to_output_among(
    output: &mut DeserializedData,
    type_name: &str,
    record: Record,
    policy: FieldPolicy,
    candidates: &[RecordId],
) -> Option<RecordId> {
    if !policy.allow_duplicates && contains_match(output, candidates, &record) {
        return None;
    }
    Some(output.push(type_name, record))
}

fn contains_match(output: &DeserializedData, candidates: &[RecordId], record: &Record) -> bool {
    candidates
        .iter()
        .any(|id| contains_fields(output.record(*id), record))
}

/// Falsy JSON values: a field holding one of these is overwritten.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Find a record of `type_name` matching `pattern`.
///
/// A bare slot is returned as-is without matching; a sequence yields its
/// first matching element.
pub fn find_in_output(output: &DeserializedData, type_name: &str, pattern: &Value) -> Option<RecordId> {
    match output.ids(type_name) {
        [] => None,
        [only] => Some(*only),
        ids => ids
            .iter()
            .copied()
            .find(|id| record_matches(output.record(*id), pattern)),
    }
}

fn contains_fields(record: &Record, fields: &Record) -> bool {
    fields
        .iter()
        .all(|(key, expected)| record.get(key).is_some_and(|actual| is_match(actual, expected)))
}

fn record_matches(record: &Record, pattern: &Value) -> bool {
    match pattern {
        Value::Object(fields) => contains_fields(record, fields),
        _ => false,
    }
}

/// Partial deep match: does `value` contain everything in `pattern`?
///
/// Objects match when every key of `pattern` matches in `value`; arrays match
/// when every element of `pattern` matches some element of `value`; other
/// values must be equal.
pub fn is_match(value: &Value, pattern: &Value) -> bool {
    match (value, pattern) {
        (Value::Object(actual), Value::Object(expected)) => expected
            .iter()
            .all(|(key, expected)| actual.get(key).is_some_and(|actual| is_match(actual, expected))),
        (Value::Array(actual), Value::Array(expected)) => expected
            .iter()
            .all(|expected| actual.iter().any(|actual| is_match(actual, expected))),
        _ => value == pattern,
    }
}
