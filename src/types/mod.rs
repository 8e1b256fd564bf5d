//! Core types for the kernel.

pub mod resource;
pub mod output;

pub use resource::{Record, ResourceView, RelationshipTarget, ValidatedRelationship};
pub use output::{DeserializedData, RecordId, Slot};
