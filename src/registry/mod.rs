//! Per-type configuration consumed by the kernel.
//!
//! The kernel only reads from a registry. Every lookup has a default, so an
//! unknown type or relationship is never an error.

pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Id field used when a type does not configure one.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Options for one relationship of a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipOptions {
    /// Related type name. Informational; resolution uses the reference's own type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,
    /// Inline the included record instead of a stub (default `true`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<bool>,
    /// Always hold the resolved value as an array (default `false`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<bool>,
}

impl RelationshipOptions {
    /// Create options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the related type.
    pub fn with_type(mut self, related_type: impl Into<String>) -> Self {
        self.related_type = Some(related_type.into());
        self
    }

    /// Set whether included records are inlined.
    pub fn with_include(mut self, include: bool) -> Self {
        self.include = Some(include);
        self
    }

    /// Set whether the field is always an array.
    pub fn with_array(mut self, array: bool) -> Self {
        self.array = Some(array);
        self
    }
}

/// Configuration of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Attribute name the resource id is stored under (default `"id"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Per-relationship options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, RelationshipOptions>,
}

impl TypeDefinition {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id field name.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id = Some(id_field.into());
        self
    }

    /// Configure a relationship.
    pub fn with_relationship(mut self, name: impl Into<String>, options: RelationshipOptions) -> Self {
        self.relationships.insert(name.into(), options);
        self
    }

    /// Id field name, falling back to [`DEFAULT_ID_FIELD`].
    pub fn id_field(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_ID_FIELD)
    }
}

/// Read-only source of per-type configuration.
///
/// Implementations must be safe to share between concurrent deserialize calls.
pub trait TypeRegistry: Send + Sync {
    /// Definition of a type, if one is registered.
    fn definition(&self, type_name: &str) -> Option<TypeDefinition>;

    /// Attribute name the id of `type_name` is stored under.
    fn id_field(&self, type_name: &str) -> String {
        self.definition(type_name)
            .and_then(|definition| definition.id)
            .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string())
    }

    /// Whether `relationship` of `type_name` inlines included records.
    fn include_relationship(&self, type_name: &str, relationship: &str) -> bool {
        self.relationship_options(type_name, relationship)
            .and_then(|options| options.include)
            .unwrap_or(true)
    }

    /// Whether `relationship` of `type_name` is always an array.
    fn relationship_is_array(&self, type_name: &str, relationship: &str) -> bool {
        self.relationship_options(type_name, relationship)
            .and_then(|options| options.array)
            .unwrap_or(false)
    }

    /// Options of one relationship, if configured.
    fn relationship_options(&self, type_name: &str, relationship: &str) -> Option<RelationshipOptions> {
        self.definition(type_name)
            .and_then(|mut definition| definition.relationships.remove(relationship))
    }
}

/// A registry with no definitions: every lookup yields its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeRegistry;

impl TypeRegistry for DefaultTypeRegistry {
    fn definition(&self, _type_name: &str) -> Option<TypeDefinition> {
        None
    }
}

pub use memory::{InMemoryTypeRegistry, RegistryError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = DefaultTypeRegistry;
        assert_eq!(registry.id_field("people"), "id");
        assert!(registry.include_relationship("photos", "photographer"));
        assert!(!registry.relationship_is_array("photos", "photographer"));
    }

    #[test]
    fn test_definition_deserializes() {
        let definition: TypeDefinition = serde_json::from_str(
            r#"{"id": "_id", "relationships": {"recipients": {"type": "to", "array": true}}}"#,
        )
        .unwrap();

        assert_eq!(definition.id_field(), "_id");
        let recipients = &definition.relationships["recipients"];
        assert_eq!(recipients.related_type.as_deref(), Some("to"));
        assert_eq!(recipients.array, Some(true));
        assert_eq!(recipients.include, None);
    }

    #[test]
    fn test_definition_builder() {
        let definition = TypeDefinition::new()
            .with_id_field("_id")
            .with_relationship("likes", RelationshipOptions::new().with_include(false));

        assert_eq!(definition.id_field(), "_id");
        assert_eq!(definition.relationships["likes"].include, Some(false));
        assert_eq!(TypeDefinition::new().id_field(), "id");
    }
}
