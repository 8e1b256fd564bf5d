//! Type-partitioned output of a deserialize call.
//!
//! Records live in an arena owned by [`DeserializedData`]; each type maps to
//! one record or a sequence of records. The first record of a type is stored
//! bare and promoted to a sequence when a second one arrives.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::resource::Record;

/// Handle to a record held by [`DeserializedData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(usize);

#[derive(Debug, Clone)]
enum SlotIds {
    Single(RecordId),
    Many(Vec<RecordId>),
}

impl SlotIds {
    fn ids(&self) -> &[RecordId] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// Records of one type: bare when only one was seen, a sequence otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<'a> {
    /// Exactly one record of this type.
    Single(&'a Record),
    /// Two or more records, in first-seen order.
    Many(Vec<&'a Record>),
}

impl<'a> Slot<'a> {
    /// Whether this slot was promoted to a sequence.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Number of records in the slot.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    /// Always false; a slot exists only once a record was added.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The bare record, if the slot was never promoted.
    pub fn as_single(&self) -> Option<&'a Record> {
        match self {
            Self::Single(record) => Some(record),
            Self::Many(_) => None,
        }
    }

    /// Render as a JSON object or array.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(record) => Value::Object((*record).clone()),
            Self::Many(records) => Value::Array(
                records.iter().map(|r| Value::Object((*r).clone())).collect(),
            ),
        }
    }
}

/// Output mapping from type name to record(s).
#[derive(Debug, Clone, Default)]
pub struct DeserializedData {
    records: Vec<Record>,
    slots: BTreeMap<String, SlotIds>,
}

impl DeserializedData {
    /// Create an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of types with at least one record.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no record was produced.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of records across all types.
    pub fn record_count(&self) -> usize {
        self.slots.values().map(|slot| slot.ids().len()).sum()
    }

    /// Type names present, in lexicographic order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Whether any record of `type_name` was produced.
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.slots.contains_key(type_name)
    }

    /// Records of a type, keeping the bare/sequence shape.
    pub fn get(&self, type_name: &str) -> Option<Slot<'_>> {
        self.slots.get(type_name).map(|slot| match slot {
            SlotIds::Single(id) => Slot::Single(&self.records[id.0]),
            SlotIds::Many(ids) => Slot::Many(ids.iter().map(|id| &self.records[id.0]).collect()),
        })
    }

    /// Records of a type as a flat list, empty if the type is absent.
    pub fn records(&self, type_name: &str) -> Vec<&Record> {
        self.ids(type_name)
            .iter()
            .map(|id| &self.records[id.0])
            .collect()
    }

    /// Render the whole output as `{type: record | [record, ..]}`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for type_name in self.slots.keys() {
            if let Some(slot) = self.get(type_name) {
                map.insert(type_name.clone(), slot.to_value());
            }
        }
        Value::Object(map)
    }

    /// Consume and render as JSON.
    pub fn into_value(self) -> Value {
        self.to_value()
    }

    /// Record ids of a type in first-seen order.
    pub(crate) fn ids(&self, type_name: &str) -> &[RecordId] {
        self.slots.get(type_name).map(SlotIds::ids).unwrap_or(&[])
    }

    /// Look up a record by handle.
    pub(crate) fn record(&self, id: RecordId) -> &Record {
        &self.records[id.0]
    }

    /// Mutable access to a record by handle.
    pub(crate) fn record_mut(&mut self, id: RecordId) -> &mut Record {
        &mut self.records[id.0]
    }

    /// Append a record under `type_name`, promoting a bare slot to a sequence.
    pub(crate) fn push(&mut self, type_name: &str, record: Record) -> RecordId {
        let id = RecordId(self.records.len());
        self.records.push(record);

        match self.slots.entry(type_name.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(SlotIds::Single(id));
            }
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                match slot {
                    SlotIds::Single(first) => *slot = SlotIds::Many(vec![*first, id]),
                    SlotIds::Many(ids) => ids.push(id),
                }
            }
        }

        id
    }
}

impl Serialize for DeserializedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<DeserializedData> for Value {
    fn from(data: DeserializedData) -> Self {
        data.into_value()
    }
}
