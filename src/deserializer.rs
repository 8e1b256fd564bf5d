//! Resource deserializer.
//!
//! Turns one validated resource into a plain record, injects its id under the
//! type's configured id field, adds it to the output and registers it in the
//! frontier for later relationship resolution.

use serde_json::Value;

use crate::frontier::Frontier;
use crate::identity::resource_hash;
use crate::registry::TypeRegistry;
use crate::types::{DeserializedData, Record, RecordId, ResourceView};

/// Deserialize `resource` into `output` and register it in `frontier`.
///
/// The record starts as a copy of the resource's attributes (empty when
/// absent). Output promotion follows [`DeserializedData`]'s rules.
pub fn deserialize_resource<R: TypeRegistry + ?Sized>(
    registry: &R,
    resource: &ResourceView<'_>,
    output: &mut DeserializedData,
    frontier: &mut Frontier,
) -> RecordId {
    let mut record: Record = resource.attributes().cloned().unwrap_or_default();

    if let Some(id) = resource.id() {
        let id_field = registry.id_field(resource.type_name());
        record.insert(id_field, Value::String(id.to_string()));
    }

    let hash = resource_hash(resource.raw());
    let record_id = output.push(resource.type_name(), record);

    tracing::trace!(
        resource_type = resource.type_name(),
        resource_id = ?resource.id(),
        hash = %hash,
        "Deserialized resource"
    );

    frontier.register(hash, record_id);
    record_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DefaultTypeRegistry, InMemoryTypeRegistry, TypeDefinition};
    use crate::validate::validate_resource;
    use serde_json::json;

    #[test]
    fn test_attributes_and_id() {
        let raw = json!({"type": "photos", "id": "1", "attributes": {"title": "Ember Hamster"}});
        let view = validate_resource(&raw).unwrap();
        let mut output = DeserializedData::new();
        let mut frontier = Frontier::new();

        let id = deserialize_resource(&DefaultTypeRegistry, &view, &mut output, &mut frontier);

        assert_eq!(
            Value::Object(output.record(id).clone()),
            json!({"title": "Ember Hamster", "id": "1"})
        );
        assert_eq!(frontier.take(&resource_hash(&raw)), Some(id));
    }

    #[test]
    fn test_configured_id_field() {
        let registry = InMemoryTypeRegistry::new();
        registry.define("people", TypeDefinition::new().with_id_field("_id")).unwrap();

        let raw = json!({"type": "people", "id": "9"});
        let view = validate_resource(&raw).unwrap();
        let mut output = DeserializedData::new();
        let mut frontier = Frontier::new();

        deserialize_resource(&registry, &view, &mut output, &mut frontier);
        assert_eq!(output.to_value(), json!({"people": {"_id": "9"}}));
    }

    #[test]
    fn test_anonymous_resource_has_no_id() {
        let raw = json!({"type": "photos", "attributes": {"title": "x"}});
        let view = validate_resource(&raw).unwrap();
        let mut output = DeserializedData::new();
        let mut frontier = Frontier::new();

        deserialize_resource(&DefaultTypeRegistry, &view, &mut output, &mut frontier);
        assert_eq!(output.to_value(), json!({"photos": {"title": "x"}}));
        assert_eq!(frontier.pending_len(), 1);
    }

    #[test]
    fn test_promotion_across_calls() {
        let mut output = DeserializedData::new();
        let mut frontier = Frontier::new();
        for id in ["2", "3"] {
            let raw = json!({"type": "people", "id": id});
            let view = validate_resource(&raw).unwrap();
            deserialize_resource(&DefaultTypeRegistry, &view, &mut output, &mut frontier);
        }
        assert_eq!(output.to_value(), json!({"people": [{"id": "2"}, {"id": "3"}]}));
    }
}
