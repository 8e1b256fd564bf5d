//! Canonical serialization for deterministic hashing.
//!
//! This module provides functions to serialize data in a canonical, deterministic format
//! suitable for hashing.
//!
//! ## Determinism Guarantees
//!
//! - Stable key order: object keys are always written in lexicographic order
//! - Unordered arrays: [`to_unordered_bytes`] sorts array elements by their own
//!   canonical encoding, so permuting an array never changes the output
//! - Typed values: strings, numbers, booleans and null are tagged so that
//!   `"1"` and `1` never encode the same

use serde::Serialize;
use serde_json::Value;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Object keys are written in lexicographic order, so the output is stable
/// for the same input.
///
/// # Panics
///
/// Panics if `value` cannot be represented as JSON (for example a map with
/// non-string keys).
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let value = serde_json::to_value(value).expect("Canonical serialization failed");
    encode(&value, false).into_bytes()
}

/// Serialize a JSON value to canonical bytes, treating every array as an
/// unordered collection.
pub fn to_unordered_bytes(value: &Value) -> Vec<u8> {
    encode(value, true).into_bytes()
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

fn encode(value: &Value, unordered: bool) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool:{}", b),
        Value::Number(n) => format!("number:{}", n),
        Value::String(s) => format!("string:{}:{}", s.len(), s),
        Value::Array(items) => {
            let mut parts: Vec<String> = items.iter().map(|item| encode(item, unordered)).collect();
            if unordered {
                parts.sort();
            }
            format!("array:{}:[{}]", parts.len(), parts.join(","))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let parts: Vec<String> = entries
                .into_iter()
                .map(|(key, value)| format!("{}:{}={}", key.len(), key, encode(value, unordered)))
                .collect();
            format!("object:{}:{{{}}}", parts.len(), parts.join(","))
        }
    }
}
