//! Structural identity hashes for resources.
//!
//! A resource is identified by its `type` plus either its `id` or, for
//! anonymous resources, the set of `(id, type)` pairs its relationships point
//! at. The descriptor is hashed with [`to_unordered_bytes`] so the order of
//! references inside a relationship's `data` array never matters.
//!
//! Two anonymous resources of the same type whose relationships reference the
//! same entities share one identity even if their attributes differ.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::canonical::to_unordered_bytes;

/// SHA-256 identity hash of a resource, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceHash(String);

impl ResourceHash {
    /// Get the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build the identity descriptor `{type, id}` for a resource.
///
/// For anonymous resources `id` is the map of relationship name to the list
/// of `{id, type}` pairs it references (singular data is wrapped in a list,
/// missing or null data becomes an empty object).
pub fn identity_descriptor(resource: &Value) -> Value {
    let mut descriptor = Map::new();
    descriptor.insert(
        "type".to_string(),
        resource.get("type").cloned().unwrap_or(Value::Null),
    );

    let id = match resource.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Value::String(id.clone()),
        _ => synthetic_id(resource.get("relationships")),
    };
    descriptor.insert("id".to_string(), id);

    Value::Object(descriptor)
}

fn synthetic_id(relationships: Option<&Value>) -> Value {
    let mut synthetic = Map::new();
    if let Some(Value::Object(relationships)) = relationships {
        for (name, relationship) in relationships {
            let references: Vec<Value> = match relationship.get("data") {
                Some(Value::Array(items)) => items.iter().map(reference_key).collect(),
                Some(other) => vec![reference_key(other)],
                None => vec![reference_key(&Value::Null)],
            };
            synthetic.insert(name.clone(), Value::Array(references));
        }
    }
    Value::Object(synthetic)
}

fn reference_key(reference: &Value) -> Value {
    let mut key = Map::new();
    for field in ["id", "type"] {
        if let Some(value) = reference.get(field) {
            key.insert(field.to_string(), value.clone());
        }
    }
    Value::Object(key)
}

/// Compute the identity hash of a resource.
pub fn resource_hash(resource: &Value) -> ResourceHash {
    let bytes = to_unordered_bytes(&identity_descriptor(resource));
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    ResourceHash(hex::encode(hasher.finalize()))
}
