//! Record types for task lists.

use crate::{RecordKey, FIELD_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// A single task: an identifying key and its description.
///
/// Two records are equal only when both the key and the payload match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier within a collection
    pub key: RecordKey,
    /// Task description
    pub payload: String,
}

impl Record {
    /// Create a new record.
    pub fn new(key: impl Into<RecordKey>, payload: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
        }
    }

    /// Whether this record survives a trip through the line format.
    ///
    /// The format has no escaping, so a separator or a line break inside
    /// either field corrupts the record when it is read back.
    pub fn is_representable(&self) -> bool {
        is_plain_field(&self.key) && is_plain_field(&self.payload)
    }
}

fn is_plain_field(field: &str) -> bool {
    !field.contains([FIELD_SEPARATOR, '\r', '\n'])
}

/// A set of records keyed by [`Record::key`].
///
/// Backed by a `BTreeMap` so that iteration, serialization and the codec
/// output are deterministic. Order carries no meaning for the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordCollection {
    records: BTreeMap<RecordKey, Record>,
}

impl RecordCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record with the same key.
    ///
    /// Returns the replaced record, if any.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.key.clone(), record)
    }

    /// Get a record by key.
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Remove a record by key.
    pub fn remove(&mut self, key: &str) -> Option<Record> {
        self.records.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(key, record)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, RecordKey, Record> {
        self.records.iter()
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> btree_map::Keys<'_, RecordKey, Record> {
        self.records.keys()
    }

    /// Iterate over records in key order.
    pub fn records(&self) -> btree_map::Values<'_, RecordKey, Record> {
        self.records.values()
    }

    /// Consume the collection, yielding its records in key order.
    pub fn into_records(self) -> impl Iterator<Item = Record> {
        self.records.into_values()
    }
}

impl FromIterator<Record> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl Extend<Record> for RecordCollection {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = (&'a RecordKey, &'a Record);
    type IntoIter = btree_map::Iter<'a, RecordKey, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for RecordCollection {
    type Item = (RecordKey, Record);
    type IntoIter = btree_map::IntoIter<RecordKey, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
