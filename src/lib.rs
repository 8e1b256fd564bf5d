//! # compound-doc-kernel
//!
//! Deterministic denormalization of compound resource documents.
//!
//! The kernel answers one question:
//!
//! > Given a primary resource (or list) and a pool of included resources,
//! > what does every entity look like with its relationships resolved in place?
//!
//! ## Core Contract
//!
//! 1. Every resource is identified by a structural identity hash of `(type, id)`,
//!    or of its relationship references when it has no id
//! 2. Every entity is relationship-resolved at most once per call, even when the
//!    resource graph has cycles or shared references
//! 3. The output groups records per type: one record is stored bare, two or
//!    more become a sequence in first-seen order
//!
//! ## Architecture
//!
//! ```text
//! Document → validate → Resource Deserializer → Frontier
//!                              ↑                   ↓
//!                              └── Relationship Resolver → DeserializedData
//!                                         ↓
//!                                   TypeRegistry
//! ```
//!
//! ## Example
//!
//! ```rust
//! use compound_doc_kernel::{deserialize, DefaultTypeRegistry, DeserializeOptions};
//! use serde_json::json;
//!
//! let document = json!({
//!     "data": {
//!         "type": "photos",
//!         "attributes": {"title": "Ember Hamster"},
//!         "relationships": {"photographer": {"data": {"type": "people", "id": "9"}}}
//!     }
//! });
//!
//! let output = deserialize(&DefaultTypeRegistry, &document, &DeserializeOptions::default()).unwrap();
//! assert_eq!(output.to_value(), json!({
//!     "photos": {"title": "Ember Hamster", "photographer": {"id": "9"}},
//!     "people": {"id": "9"}
//! }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod registry;
pub mod canonical;
pub mod identity;
pub mod validate;
pub mod accumulator;
pub mod frontier;
pub mod deserializer;
pub mod resolver;
pub mod denormalizer;
pub mod options;
pub mod error;

// Re-exports
pub use types::{DeserializedData, Record, RecordId, Slot, ResourceView, RelationshipTarget};
pub use registry::{
    TypeRegistry, TypeDefinition, RelationshipOptions, DefaultTypeRegistry,
    InMemoryTypeRegistry, RegistryError, DEFAULT_ID_FIELD,
};
pub use canonical::{to_canonical_bytes, to_unordered_bytes, canonical_hash, canonical_hash_hex};
pub use identity::{ResourceHash, resource_hash, identity_descriptor};
pub use accumulator::{FieldPolicy, add_to_field, is_match};
pub use frontier::Frontier;
pub use deserializer::deserialize_resource;
pub use resolver::RelationshipResolver;
pub use denormalizer::{Denormalizer, deserialize};
pub use options::DeserializeOptions;
pub use error::{DeserializeError, ErrorObject, VALIDATION_STATUS};
