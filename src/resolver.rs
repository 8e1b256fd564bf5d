//! Relationship resolver.
//!
//! Walks the relationships of deserialized resources depth-first: relationship
//! names in document order, then references in document order. A reference
//! found in the `included` pool is deserialized and resolved before the walk
//! moves on; anything else degrades to a stub record holding only the related
//! id.
//!
//! ## Termination
//!
//! Each resource is resolved at most once per call. The frontier entry is
//! consumed before descending into children, so cycles (A → B → A) stop at the
//! second visit and shared references are walked only once.
//!
//! The walk keeps its own stack of frames instead of recursing, so chain
//! depth is bounded by memory rather than by the thread's call stack.

use std::collections::HashMap;

use serde_json::Value;

use crate::accumulator::{add_to_output_among, add_to_record_field, find_in_output, FieldPolicy};
use crate::deserializer::deserialize_resource;
use crate::error::DeserializeError;
use crate::frontier::Frontier;
use crate::identity::resource_hash;
use crate::options::DeserializeOptions;
use crate::registry::TypeRegistry;
use crate::types::{
    DeserializedData, Record, RecordId, RelationshipTarget, ResourceView, ValidatedRelationship,
};
use crate::validate::validate_relationships;

/// One resource under resolution: its record and a cursor over its references.
struct Frame<'doc> {
    owner: RecordId,
    owner_type: &'doc str,
    relationships: Vec<ValidatedRelationship<'doc>>,
    relationship: usize,
    target: usize,
}

impl<'doc> Frame<'doc> {
    /// The reference under the cursor, skipping relationships with no data.
    fn current(&mut self) -> Option<(&'doc str, RelationshipTarget<'doc>)> {
        while let Some(relationship) = self.relationships.get(self.relationship) {
            if let Some(target) = relationship.targets.get(self.target) {
                return Some((relationship.name, *target));
            }
            self.relationship += 1;
            self.target = 0;
        }
        None
    }

    fn advance(&mut self) {
        self.target += 1;
    }
}

/// Mutable state of one deserialize call: the output and the frontier.
///
/// Each top-level call owns its own resolver; nothing here is shared.
pub struct RelationshipResolver<'r, 'doc, R: TypeRegistry + ?Sized> {
    registry: &'r R,
    options: &'r DeserializeOptions,
    included: HashMap<(&'doc str, &'doc str), ResourceView<'doc>>,
    /// Output records by `(type, id field value)`, for stub deduplication.
    by_id: HashMap<(&'doc str, String), Vec<RecordId>>,
    frontier: Frontier,
    output: DeserializedData,
}

impl<'r, 'doc, R: TypeRegistry + ?Sized> RelationshipResolver<'r, 'doc, R> {
    /// Create a resolver over an `included` pool.
    ///
    /// When the pool holds the same `(type, id)` twice, the first one wins.
    pub fn new(
        registry: &'r R,
        options: &'r DeserializeOptions,
        included: &[ResourceView<'doc>],
    ) -> Self {
        let mut index = HashMap::with_capacity(included.len());
        for resource in included {
            if let Some(id) = resource.id() {
                index.entry((resource.type_name(), id)).or_insert(*resource);
            }
        }

        Self {
            registry,
            options,
            included: index,
            by_id: HashMap::new(),
            frontier: Frontier::new(),
            output: DeserializedData::new(),
        }
    }

    /// Deserialize a resource into the output and mark it for resolution.
    pub fn deserialize(&mut self, resource: &ResourceView<'doc>) -> RecordId {
        let record_id =
            deserialize_resource(self.registry, resource, &mut self.output, &mut self.frontier);
        self.index_record(resource.type_name(), record_id);
        record_id
    }

    /// Deserialize a resource unless one with the same identity already was.
    ///
    /// Returns `None` when the resource was already deserialized.
    pub fn deserialize_once(&mut self, resource: &ResourceView<'doc>) -> Option<RecordId> {
        if self.frontier.is_registered(&resource_hash(resource.raw())) {
            return None;
        }
        Some(self.deserialize(resource))
    }

    /// Resolve the relationships of an already deserialized resource.
    ///
    /// Returns immediately if the resource was resolved before or was never
    /// deserialized. Validation failures abort the whole walk.
    pub fn resolve(&mut self, resource: &ResourceView<'doc>) -> Result<(), DeserializeError> {
        let Some(root) = self.enter(resource)? else {
            return Ok(());
        };

        let mut stack = vec![root];
        while let Some(frame) = stack.last_mut() {
            let Some((_, target)) = frame.current() else {
                stack.pop();
                if let Some(parent) = stack.last_mut() {
                    self.finish_target(parent);
                }
                continue;
            };

            let Some(related) = self.included.get(&(target.type_name, target.id)).copied() else {
                tracing::debug!(
                    related_type = target.type_name,
                    related_id = target.id,
                    "Related resource not included, using stub reference"
                );
                let stub = self.stub(&target);
                self.add_stub(target.type_name, stub.clone());
                self.attach(frame, Value::Object(stub));
                continue;
            };

            self.deserialize_once(&related);
            match self.enter(&related)? {
                Some(child) => stack.push(child),
                None => self.finish_target(frame),
            }
        }

        Ok(())
    }

    /// Finish the call, returning the output and the residual frontier.
    pub fn finish(self) -> (DeserializedData, Frontier) {
        (self.output, self.frontier)
    }

    /// Validate a resource's relationships and claim its frontier entry.
    ///
    /// `None` when the resource is resolved already or was never registered.
    fn enter(&mut self, resource: &ResourceView<'doc>) -> Result<Option<Frame<'doc>>, DeserializeError> {
        let relationships = validate_relationships(resource)?;

        let hash = resource_hash(resource.raw());
        let Some(owner) = self.frontier.take(&hash) else {
            tracing::trace!(
                resource_type = resource.type_name(),
                resource_id = ?resource.id(),
                "Skipping resolved or unregistered resource"
            );
            return Ok(None);
        };

        Ok(Some(Frame {
            owner,
            owner_type: resource.type_name(),
            relationships,
            relationship: 0,
            target: 0,
        }))
    }

    /// Attach the value for an included reference whose walk has completed.
    fn finish_target(&mut self, frame: &mut Frame<'doc>) {
        let Some((name, target)) = frame.current() else {
            return;
        };

        let stub = Value::Object(self.stub(&target));
        let nest = self.options.nest_deserialized_relationships
            && self.registry.include_relationship(frame.owner_type, name);

        let value = if nest {
            match find_in_output(&self.output, target.type_name, &stub) {
                Some(id) => Value::Object(self.output.record(id).clone()),
                None => stub,
            }
        } else {
            stub
        };
        self.attach(frame, value);
    }

    /// Merge `value` into the owner's field for the reference under the
    /// cursor, then move the cursor on.
    fn attach(&mut self, frame: &mut Frame<'doc>, value: Value) {
        if let Some((name, _)) = frame.current() {
            let force_array = self.registry.relationship_is_array(frame.owner_type, name);
            add_to_record_field(
                self.output.record_mut(frame.owner),
                name,
                value,
                FieldPolicy::relationship(force_array),
            );
        }
        frame.advance();
    }

    fn stub(&self, target: &RelationshipTarget<'doc>) -> Record {
        let mut stub = Record::new();
        stub.insert(
            self.registry.id_field(target.type_name),
            Value::String(target.id.to_string()),
        );
        stub
    }

    /// Add a stub to the output unless a record of its type already has its id.
    fn add_stub(&mut self, type_name: &'doc str, stub: Record) {
        let candidates = stub
            .values()
            .next()
            .and_then(Value::as_str)
            .and_then(|id| self.by_id.get(&(type_name, id.to_string())))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if let Some(record_id) =
            add_to_output_among(&mut self.output, type_name, stub, FieldPolicy::unique(), candidates)
        {
            self.index_record(type_name, record_id);
        }
    }

    fn index_record(&mut self, type_name: &'doc str, record_id: RecordId) {
        let id_field = self.registry.id_field(type_name);
        if let Some(Value::String(id)) = self.output.record(record_id).get(&id_field) {
            self.by_id
                .entry((type_name, id.clone()))
                .or_default()
                .push(record_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DefaultTypeRegistry, InMemoryTypeRegistry, TypeDefinition};
    use crate::validate::validate_resource;
    use serde_json::json;

    #[test]
    fn test_stub_for_missing_include() {
        let raw = json!({
            "type": "photos",
            "attributes": {"title": "Ember Hamster"},
            "relationships": {"photographer": {"data": {"type": "people", "id": "9"}}}
        });
        let view = validate_resource(&raw).unwrap();
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &[]);

        resolver.deserialize(&view);
        resolver.resolve(&view).unwrap();
        let (output, frontier) = resolver.finish();

        assert_eq!(
            output.to_value(),
            json!({
                "photos": {"title": "Ember Hamster", "photographer": {"id": "9"}},
                "people": {"id": "9"}
            })
        );
        assert_eq!(frontier.pending_len(), 0);
    }

    #[test]
    fn test_second_resolve_is_noop() {
        let raw = json!({
            "type": "photos",
            "id": "1",
            "relationships": {"likes": {"data": [{"type": "people", "id": "9"}]}}
        });
        let view = validate_resource(&raw).unwrap();
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &[]);

        resolver.deserialize(&view);
        resolver.resolve(&view).unwrap();
        resolver.resolve(&view).unwrap();
        let (output, _) = resolver.finish();

        assert_eq!(output.to_value()["photos"]["likes"], json!({"id": "9"}));
    }

    #[test]
    fn test_unregistered_resource_is_skipped() {
        let raw = json!({
            "type": "photos",
            "id": "1",
            "relationships": {"likes": {"data": [{"type": "people", "id": "9"}]}}
        });
        let view = validate_resource(&raw).unwrap();
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &[]);

        resolver.resolve(&view).unwrap();
        let (output, _) = resolver.finish();
        assert!(output.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let primary = json!({
            "type": "people",
            "id": "1",
            "relationships": {"friend": {"data": {"type": "people", "id": "2"}}}
        });
        let included = json!({
            "type": "people",
            "id": "2",
            "relationships": {"friend": {"data": {"type": "people", "id": "1"}}}
        });
        let primary = validate_resource(&primary).unwrap();
        let pool = vec![validate_resource(&included).unwrap()];
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &pool);

        resolver.deserialize(&primary);
        resolver.resolve(&primary).unwrap();
        let (output, _) = resolver.finish();

        assert_eq!(
            output.to_value(),
            json!({"people": [
                {"id": "1", "friend": {"id": "2"}},
                {"id": "2", "friend": {"id": "1"}}
            ]})
        );
    }

    #[test]
    fn test_invalid_relationship_aborts() {
        let raw = json!({
            "type": "user",
            "relationships": {"groups": {"data": [{"id": "1"}]}}
        });
        let view = validate_resource(&raw).unwrap();
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &[]);

        resolver.deserialize(&view);
        let err = resolver.resolve(&view).unwrap_err();
        assert_eq!(err.resource(), Some(&raw));
    }

    #[test]
    fn test_child_walk_completes_before_sibling() {
        let primary = json!({
            "type": "posts",
            "id": "1",
            "relationships": {
                "author": {"data": {"type": "people", "id": "9"}},
                "tags": {"data": [{"type": "tags", "id": "b"}]}
            }
        });
        let author = json!({
            "type": "people",
            "id": "9",
            "relationships": {"favorite": {"data": {"type": "tags", "id": "a"}}}
        });
        let primary = validate_resource(&primary).unwrap();
        let pool = vec![validate_resource(&author).unwrap()];
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &pool);

        resolver.deserialize(&primary);
        resolver.resolve(&primary).unwrap();
        let (output, frontier) = resolver.finish();

        assert_eq!(output.to_value()["tags"], json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(output.to_value()["posts"]["author"], json!({"id": "9"}));
        assert_eq!(frontier.pending_len(), 0);
    }

    #[test]
    fn test_first_duplicate_in_pool_wins() {
        let primary = json!({
            "type": "photos",
            "id": "1",
            "relationships": {"photographer": {"data": {"type": "people", "id": "9"}}}
        });
        let first = json!({"type": "people", "id": "9", "attributes": {"name": "first"}});
        let second = json!({"type": "people", "id": "9", "attributes": {"name": "second"}});
        let primary = validate_resource(&primary).unwrap();
        let pool = vec![validate_resource(&first).unwrap(), validate_resource(&second).unwrap()];
        let options = DeserializeOptions::new().with_nesting(true);
        let mut resolver = RelationshipResolver::new(&DefaultTypeRegistry, &options, &pool);

        resolver.deserialize(&primary);
        resolver.resolve(&primary).unwrap();
        let (output, _) = resolver.finish();

        assert_eq!(
            output.to_value()["photos"]["photographer"],
            json!({"id": "9", "name": "first"})
        );
    }

    #[test]
    fn test_stub_dedup_uses_configured_id_field() {
        let registry = InMemoryTypeRegistry::new();
        registry.define("people", TypeDefinition::new().with_id_field("_id")).unwrap();
        let primary = json!({
            "type": "photos",
            "id": "1",
            "relationships": {"likes": {"data": [
                {"type": "people", "id": "9"},
                {"type": "people", "id": "9"},
                {"type": "people", "id": "10"}
            ]}}
        });
        let existing = json!({"type": "people", "id": "10", "attributes": {"name": "Ann"}});
        let primary = validate_resource(&primary).unwrap();
        let existing = validate_resource(&existing).unwrap();
        let options = DeserializeOptions::default();
        let mut resolver = RelationshipResolver::new(&registry, &options, &[]);

        resolver.deserialize(&primary);
        resolver.deserialize(&existing);
        resolver.resolve(&primary).unwrap();
        let (output, _) = resolver.finish();

        assert_eq!(
            output.to_value()["people"],
            json!([{"_id": "10", "name": "Ann"}, {"_id": "9"}])
        );
    }
}
