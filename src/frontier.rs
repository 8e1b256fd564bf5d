//! Resolution guard for one deserialize call.
//!
//! An entry is pending between deserialization and relationship resolution.
//! [`Frontier::take`] consumes the entry before the resolver descends, so a
//! resource reached again through a cycle is never resolved twice.

use std::collections::{HashMap, HashSet};

use crate::identity::ResourceHash;
use crate::types::RecordId;

/// Deserialized-but-unresolved resources, keyed by identity hash.
#[derive(Debug, Default)]
pub struct Frontier {
    pending: HashMap<ResourceHash, RecordId>,
    registered: HashSet<ResourceHash>,
}

impl Frontier {
    /// Create an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a freshly deserialized record as pending resolution.
    ///
    /// A later registration under the same hash replaces the pending record.
    pub fn register(&mut self, hash: ResourceHash, record: RecordId) {
        self.registered.insert(hash.clone());
        self.pending.insert(hash, record);
    }

    /// Remove and return the pending record for `hash`.
    ///
    /// `None` means the resource was already resolved or never registered.
    pub fn take(&mut self, hash: &ResourceHash) -> Option<RecordId> {
        self.pending.remove(hash)
    }

    /// Whether a resource with this hash was ever deserialized in this call.
    pub fn is_registered(&self, hash: &ResourceHash) -> bool {
        self.registered.contains(hash)
    }

    /// Number of records still awaiting resolution.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
