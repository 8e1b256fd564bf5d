//! In-memory type registry.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::canonical::canonical_hash_hex;
use super::{RelationshipOptions, TypeDefinition, TypeRegistry, DEFAULT_ID_FIELD};

/// Error type for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Type names must be non-empty.
    #[error("Type name must not be empty")]
    EmptyTypeName,
    /// Configuration could not be parsed.
    #[error("Invalid type configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct RegistryState {
    types: BTreeMap<String, TypeDefinition>,
    fingerprint: String,
}

impl RegistryState {
    fn update_fingerprint(&mut self) {
        self.fingerprint = canonical_hash_hex(&self.types);
    }
}

/// Type registry held in memory.
///
/// Definitions may be added while other threads read; readers always see a
/// complete definition. Uses a BTreeMap so the fingerprint is deterministic.
#[derive(Debug)]
pub struct InMemoryTypeRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        let mut state = RegistryState::default();
        state.update_fingerprint();
        Self {
            state: RwLock::new(state),
        }
    }

    /// Load definitions from a JSON object mapping type name to definition.
    pub fn from_json(config: &Value) -> Result<Self, RegistryError> {
        let types: BTreeMap<String, TypeDefinition> = serde_json::from_value(config.clone())?;
        let registry = Self::new();
        for (type_name, definition) in types {
            registry.define(type_name, definition)?;
        }
        Ok(registry)
    }

    /// Register (or replace) the definition of a type.
    pub fn define(&self, type_name: impl Into<String>, definition: TypeDefinition) -> Result<(), RegistryError> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(RegistryError::EmptyTypeName);
        }

        let mut state = self.state.write();
        state.types.insert(type_name, definition);
        state.update_fingerprint();
        Ok(())
    }

    /// Registered type names.
    pub fn types(&self) -> Vec<String> {
        self.state.read().types.keys().cloned().collect()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.state.read().types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.state.read().types.is_empty()
    }

    /// Get the registry fingerprint.
    ///
    /// This changes whenever a definition is added or replaced.
    pub fn fingerprint(&self) -> String {
        self.state.read().fingerprint.clone()
    }
}

impl Default for InMemoryTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTypeRegistry {
    /// Run `f` against a borrowed definition under the read lock.
    fn with_definition<T>(&self, type_name: &str, f: impl FnOnce(&TypeDefinition) -> T) -> Option<T> {
        self.state.read().types.get(type_name).map(f)
    }

    fn relationship_flag(
        &self,
        type_name: &str,
        relationship: &str,
        flag: impl FnOnce(&RelationshipOptions) -> Option<bool>,
    ) -> Option<bool> {
        self.with_definition(type_name, |definition| {
            definition.relationships.get(relationship).and_then(flag)
        })
        .flatten()
    }
}

// The provided lookups clone the whole definition; these borrow it instead.
impl TypeRegistry for InMemoryTypeRegistry {
    fn definition(&self, type_name: &str) -> Option<TypeDefinition> {
        self.state.read().types.get(type_name).cloned()
    }

    fn id_field(&self, type_name: &str) -> String {
        self.with_definition(type_name, |definition| definition.id_field().to_string())
            .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string())
    }

    fn include_relationship(&self, type_name: &str, relationship: &str) -> bool {
        self.relationship_flag(type_name, relationship, |options| options.include)
            .unwrap_or(true)
    }

    fn relationship_is_array(&self, type_name: &str, relationship: &str) -> bool {
        self.relationship_flag(type_name, relationship, |options| options.array)
            .unwrap_or(false)
    }

    fn relationship_options(&self, type_name: &str, relationship: &str) -> Option<RelationshipOptions> {
        self.with_definition(type_name, |definition| {
            definition.relationships.get(relationship).cloned()
        })
        .flatten()
    }
}
