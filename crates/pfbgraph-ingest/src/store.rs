//! Per-table entity storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flat attribute record of one entity.
pub type Attributes = Map<String, Value>;

/// One exported row: the entity key and its attribute record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key: String,
    pub value: Attributes,
}

/// Keyed attribute records for one vertex or edge table.
///
/// Insert-only; inserting under an existing key replaces the previous record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    name: String,
    rows: BTreeMap<String, Attributes>,
}

impl EntityStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `attributes` under `key`, returning the record it replaced.
    pub fn insert(&mut self, key: impl Into<String>, attributes: Attributes) -> Option<Attributes> {
        self.rows.insert(key.into(), attributes)
    }

    pub fn get(&self, key: &str) -> Option<&Attributes> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every row as a `(key, attributes)` pair for bulk handoff.
    pub fn export(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|(key, value)| Row {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}
