//! Shape validation for documents, resources and relationships.
//!
//! Validation is local and deterministic. The first violation found is
//! reported with a detail message naming the offending member; nothing is
//! mutated before validation of a value completes.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::error::DeserializeError;
use crate::types::{RelationshipTarget, ResourceView, ValidatedRelationship};

const RESOURCE_KEYS: [&str; 6] = ["id", "type", "attributes", "relationships", "links", "meta"];
const REFERENCE_KEYS: [&str; 5] = ["id", "type", "attributes", "links", "meta"];

fn relationship_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w+$").expect("relationship name pattern is valid"))
}

/// Primary and included resources of a validated document.
#[derive(Debug, Clone, Default)]
pub struct DocumentParts<'a> {
    /// Primary resources in document order (empty for null or absent `data`).
    pub primary: Vec<ResourceView<'a>>,
    /// The `included` pool in document order.
    pub included: Vec<ResourceView<'a>>,
}

/// Validate a document envelope and every resource it carries.
pub fn validate_document(document: &Value) -> Result<DocumentParts<'_>, DeserializeError> {
    let envelope = document.as_object().ok_or_else(|| DeserializeError::InvalidDocument {
        detail: "\"payload\" must be an object".to_string(),
        document: document.clone(),
    })?;

    let primary = match envelope.get("data") {
        None | Some(Value::Null) => Vec::new(),
        Some(resource @ Value::Object(_)) => vec![validate_resource(resource)?],
        Some(Value::Array(items)) => items
            .iter()
            .map(validate_resource)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(DeserializeError::InvalidDocument {
                detail: "\"data\" must be an object, an array or null".to_string(),
                document: document.clone(),
            })
        }
    };

    let included = match envelope.get("included") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(validate_resource)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(DeserializeError::InvalidDocument {
                detail: "\"included\" must be an array".to_string(),
                document: document.clone(),
            })
        }
    };

    Ok(DocumentParts { primary, included })
}

/// Validate a single resource object.
pub fn validate_resource(resource: &Value) -> Result<ResourceView<'_>, DeserializeError> {
    let invalid = |detail: String| DeserializeError::InvalidResource {
        detail,
        resource: resource.clone(),
    };

    let map = resource
        .as_object()
        .ok_or_else(|| invalid("\"resource\" must be an object".to_string()))?;

    let id = optional_string(map, "id", "").map_err(&invalid)?;
    let type_name = required_string(map, "type", "").map_err(&invalid)?;
    let attributes = optional_object(map, "attributes", "").map_err(&invalid)?;
    let relationships = optional_object(map, "relationships", "").map_err(&invalid)?;
    optional_object(map, "links", "").map_err(&invalid)?;
    optional_object(map, "meta", "").map_err(&invalid)?;
    reject_unknown(map, &RESOURCE_KEYS, "").map_err(&invalid)?;

    Ok(ResourceView::new(resource, type_name, id, attributes, relationships))
}

/// Validate the relationships of a resource and collect their references.
///
/// Relationships and their references are returned in document order.
pub fn validate_relationships<'a>(
    resource: &ResourceView<'a>,
) -> Result<Vec<ValidatedRelationship<'a>>, DeserializeError> {
    let Some(relationships) = resource.relationships() else {
        return Ok(Vec::new());
    };

    let invalid = |detail: String| DeserializeError::InvalidRelationship {
        detail,
        resource: resource.raw().clone(),
    };

    let mut validated = Vec::with_capacity(relationships.len());
    for (name, relationship) in relationships {
        if !relationship_name_pattern().is_match(name) {
            return Err(invalid(format!("\"{}\" is not allowed", name)));
        }

        let relationship = relationship
            .as_object()
            .ok_or_else(|| invalid(format!("\"{}\" must be an object", name)))?;

        let targets = match relationship.get("data") {
            None | Some(Value::Null) => Vec::new(),
            Some(reference @ Value::Object(_)) => {
                vec![validate_reference(reference, &format!("{}.data", name)).map_err(&invalid)?]
            }
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, reference)| validate_reference(reference, &format!("{}.data[{}]", name, i)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(&invalid)?,
            Some(_) => {
                return Err(invalid(format!(
                    "\"{}.data\" must be an object, an array or null",
                    name
                )))
            }
        };

        validated.push(ValidatedRelationship {
            name: name.as_str(),
            targets,
        });
    }

    Ok(validated)
}

fn validate_reference<'a>(reference: &'a Value, path: &str) -> Result<RelationshipTarget<'a>, String> {
    let map = reference
        .as_object()
        .ok_or_else(|| format!("\"{}\" must be an object", path))?;

    let id = required_string(map, "id", path)?;
    let type_name = required_string(map, "type", path)?;
    optional_object(map, "attributes", path)?;
    optional_object(map, "links", path)?;
    optional_object(map, "meta", path)?;
    reject_unknown(map, &REFERENCE_KEYS, path)?;

    Ok(RelationshipTarget { type_name, id })
}

fn member_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn required_string<'a>(map: &'a Map<String, Value>, key: &str, prefix: &str) -> Result<&'a str, String> {
    match optional_string(map, key, prefix)? {
        Some(value) => Ok(value),
        None => Err(format!("\"{}\" is required", member_path(prefix, key))),
    }
}

fn optional_string<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    prefix: &str,
) -> Result<Option<&'a str>, String> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Err(format!(
            "\"{}\" is not allowed to be empty",
            member_path(prefix, key)
        )),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("\"{}\" must be a string", member_path(prefix, key))),
    }
}

fn optional_object<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    prefix: &str,
) -> Result<Option<&'a Map<String, Value>>, String> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(format!("\"{}\" must be an object", member_path(prefix, key))),
    }
}

fn reject_unknown(map: &Map<String, Value>, allowed: &[&str], prefix: &str) -> Result<(), String> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(format!("\"{}\" is not allowed", member_path(prefix, key))),
        None => Ok(()),
    }
}
