//! Validated views over raw document resources.
//!
//! Documents stay as `serde_json::Value`; the validation layer hands out these
//! borrowed views once a value is known to have the right shape.

use serde_json::{Map, Value};

/// A deserialized resource: a plain attribute map with the id injected.
pub type Record = Map<String, Value>;

/// A resource object that passed shape validation.
#[derive(Debug, Clone, Copy)]
pub struct ResourceView<'a> {
    raw: &'a Value,
    type_name: &'a str,
    id: Option<&'a str>,
    attributes: Option<&'a Map<String, Value>>,
    relationships: Option<&'a Map<String, Value>>,
}

impl<'a> ResourceView<'a> {
    pub(crate) fn new(
        raw: &'a Value,
        type_name: &'a str,
        id: Option<&'a str>,
        attributes: Option<&'a Map<String, Value>>,
        relationships: Option<&'a Map<String, Value>>,
    ) -> Self {
        Self {
            raw,
            type_name,
            id,
            attributes,
            relationships,
        }
    }

    /// The resource exactly as it appeared in the document.
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    /// Resource type.
    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    /// Resource id, absent for anonymous resources.
    pub fn id(&self) -> Option<&'a str> {
        self.id
    }

    /// Attribute map, if the resource has one.
    pub fn attributes(&self) -> Option<&'a Map<String, Value>> {
        self.attributes
    }

    /// Raw relationships map, if the resource has one.
    pub fn relationships(&self) -> Option<&'a Map<String, Value>> {
        self.relationships
    }

    /// Whether this resource is the one named by `target`.
    pub fn is_target(&self, target: &RelationshipTarget<'_>) -> bool {
        self.type_name == target.type_name && self.id == Some(target.id)
    }
}

/// A `(type, id)` reference found in a relationship's `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipTarget<'a> {
    /// Referenced type.
    pub type_name: &'a str,
    /// Referenced id.
    pub id: &'a str,
}

/// One named relationship with its references in document order.
///
/// Null `data` (or no `data` member at all) yields an empty target list.
#[derive(Debug, Clone)]
pub struct ValidatedRelationship<'a> {
    /// Relationship name.
    pub name: &'a str,
    /// References in document order.
    pub targets: Vec<RelationshipTarget<'a>>,
}
