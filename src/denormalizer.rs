//! Top-level document denormalizer.
//!
//! Converts a compound document into a per-type grouping of plain records with
//! relationships resolved in place.
//!
//! ## Algorithm
//!
//! 1. Validate the envelope and every primary and included resource
//! 2. Deserialize the primary resources (and, if configured, the whole
//!    `included` pool) into the output, registering each in the frontier
//! 3. Resolve the relationships of each primary resource depth-first
//! 4. Return the output; the frontier is discarded
//!
//! Any validation failure aborts the call and no partial output is returned.

use std::sync::Arc;

use serde_json::Value;

use crate::error::DeserializeError;
use crate::options::DeserializeOptions;
use crate::registry::TypeRegistry;
use crate::resolver::RelationshipResolver;
use crate::types::DeserializedData;
use crate::validate::validate_document;

/// Deserialize a compound document.
///
/// `data` may be a single resource, an array of resources, null or absent;
/// the last two yield an empty output.
pub fn deserialize<R: TypeRegistry + ?Sized>(
    registry: &R,
    document: &Value,
    options: &DeserializeOptions,
) -> Result<DeserializedData, DeserializeError> {
    let span = tracing::debug_span!("deserialize", params_hash = %options.params_hash());
    let _enter = span.enter();

    let parts = match validate_document(document) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(title = e.title(), detail = e.detail(), "Rejected document");
            return Err(e);
        }
    };

    tracing::debug!(
        primary = parts.primary.len(),
        included = parts.included.len(),
        "Deserializing document"
    );

    let mut resolver = RelationshipResolver::new(registry, options, &parts.included);

    for resource in &parts.primary {
        resolver.deserialize(resource);
    }

    if options.deserialize_included {
        for resource in &parts.included {
            resolver.deserialize_once(resource);
        }
    }

    for resource in &parts.primary {
        if let Err(e) = resolver.resolve(resource) {
            tracing::warn!(title = e.title(), detail = e.detail(), "Rejected relationship");
            return Err(e);
        }
    }

    let (output, frontier) = resolver.finish();

    tracing::debug!(
        types = output.len(),
        records = output.record_count(),
        unresolved = frontier.pending_len(),
        "Deserialized document"
    );

    Ok(output)
}

/// Deserializer bound to a type registry and options.
///
/// Cheap to clone and safe to share; every call owns its own output and
/// frontier, so concurrent calls never observe each other.
pub struct Denormalizer<R: TypeRegistry + ?Sized> {
    registry: Arc<R>,
    options: DeserializeOptions,
}

impl<R: TypeRegistry + ?Sized> Denormalizer<R> {
    /// Create a denormalizer.
    ///
    /// # Arguments
    /// * `registry` - Per-type configuration (id field, relationship options)
    /// * `options` - Call options shared by every document
    pub fn new(registry: Arc<R>, options: DeserializeOptions) -> Self {
        Self { registry, options }
    }

    /// Deserialize a compound document.
    pub fn deserialize(&self, document: &Value) -> Result<DeserializedData, DeserializeError> {
        deserialize(self.registry.as_ref(), document, &self.options)
    }

    /// Get the options.
    pub fn options(&self) -> &DeserializeOptions {
        &self.options
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }
}

impl<R: TypeRegistry + ?Sized> Clone for Denormalizer<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            options: self.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DefaultTypeRegistry, InMemoryTypeRegistry, TypeDefinition};
    use serde_json::json;

    fn people_registry() -> Arc<InMemoryTypeRegistry> {
        let registry = InMemoryTypeRegistry::new();
        registry.define("people", TypeDefinition::new().with_id_field("_id")).unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_empty_forms() {
        let denormalizer = Denormalizer::new(people_registry(), DeserializeOptions::default());

        for document in [json!({"data": null}), json!({"data": []}), json!({})] {
            let output = denormalizer.deserialize(&document).unwrap();
            assert!(output.is_empty());
            assert_eq!(output.to_value(), json!({}));
        }
    }

    #[test]
    fn test_single_resource_is_bare() {
        let denormalizer = Denormalizer::new(people_registry(), DeserializeOptions::default());
        let output = denormalizer
            .deserialize(&json!({"data": {"type": "people", "id": "12"}}))
            .unwrap();

        assert_eq!(output.to_value(), json!({"people": {"_id": "12"}}));
    }

    #[test]
    fn test_included_pool_up_front() {
        let document = json!({
            "data": {"type": "people", "id": "1"},
            "included": [{"type": "people", "id": "2"}, {"type": "tags", "id": "x"}]
        });

        let lazy = deserialize(&DefaultTypeRegistry, &document, &DeserializeOptions::default()).unwrap();
        assert_eq!(lazy.to_value(), json!({"people": {"id": "1"}}));

        let eager = deserialize(
            &DefaultTypeRegistry,
            &document,
            &DeserializeOptions::new().with_included(true),
        )
        .unwrap();
        assert_eq!(
            eager.to_value(),
            json!({"people": [{"id": "1"}, {"id": "2"}], "tags": {"id": "x"}})
        );
    }

    #[test]
    fn test_validation_error_has_no_output() {
        let denormalizer = Denormalizer::new(people_registry(), DeserializeOptions::default());
        let bad = json!({"attributes": {"first": "bob", "last": "smith"}});
        let err = denormalizer.deserialize(&json!({"data": bad.clone()})).unwrap_err();

        assert_eq!(err.status(), 400);
        assert_eq!(err.resource(), Some(&bad));
    }

    #[test]
    fn test_clone_shares_registry() {
        let denormalizer = Denormalizer::new(people_registry(), DeserializeOptions::nested());
        let cloned = denormalizer.clone();
        assert_eq!(cloned.registry().id_field("people"), "_id");
        assert!(cloned.options().nest_deserialized_relationships);
    }
}
