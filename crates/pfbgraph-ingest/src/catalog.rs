//! Entity table catalog: every vertex and edge table discovered in the stream,
//! plus the join fields observed on each edge table.
//!
//! Tables are addressed by name. Edge table names are built as
//! `"<src><sep><dst>"`, but the vertex/edge distinction lives in
//! [`TableKind`]; nothing downstream parses names back apart.

use crate::store::{Attributes, EntityStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Joins the two type names of an edge table and the two ids of an edge key.
pub const TABLE_SEPARATOR: char = ':';

pub fn edge_table_name(source: &str, destination: &str) -> String {
    format!("{source}{TABLE_SEPARATOR}{destination}")
}

pub fn edge_key(source_id: &str, destination_id: &str) -> String {
    format!("{source_id}{TABLE_SEPARATOR}{destination_id}")
}

/// Whether `name` can be used as an entity type name.
pub fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(TABLE_SEPARATOR)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeEndpoints {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableKind {
    Vertex,
    Edge(EdgeEndpoints),
}

impl TableKind {
    pub fn is_vertex(&self) -> bool {
        matches!(self, TableKind::Vertex)
    }

    pub fn endpoints(&self) -> Option<&EdgeEndpoints> {
        match self {
            TableKind::Vertex => None,
            TableKind::Edge(endpoints) => Some(endpoints),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    kind: TableKind,
    store: EntityStore,
}

impl Table {
    pub fn kind(&self) -> &TableKind {
        &self.kind
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
    edge_fields: BTreeMap<String, BTreeSet<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or resets) the vertex table for `type_name`.
    ///
    /// Returns `false` without touching the catalog when the name is not a
    /// usable type name.
    pub fn declare_vertex_table(&mut self, type_name: &str) -> bool {
        if !is_valid_type_name(type_name) {
            warn!(type_name, "ignoring entity type with an unusable name");
            return false;
        }
        self.tables.insert(
            type_name.to_string(),
            Table {
                kind: TableKind::Vertex,
                store: EntityStore::new(type_name),
            },
        );
        true
    }

    /// Creates (or resets) the edge table `source -> destination` and its
    /// empty join-field entry. Returns the table name.
    pub fn declare_edge_table(&mut self, source: &str, destination: &str) -> Option<String> {
        if !is_valid_type_name(source) || !is_valid_type_name(destination) {
            warn!(source, destination, "ignoring link with an unusable type name");
            return None;
        }
        let name = edge_table_name(source, destination);
        self.tables.insert(
            name.clone(),
            Table {
                kind: TableKind::Edge(EdgeEndpoints {
                    source: source.to_string(),
                    destination: destination.to_string(),
                }),
                store: EntityStore::new(name.clone()),
            },
        );
        self.edge_fields.insert(name.clone(), BTreeSet::new());
        Some(name)
    }

    pub fn vertex_table_mut(&mut self, type_name: &str) -> Option<&mut EntityStore> {
        match self.tables.get_mut(type_name) {
            Some(Table {
                kind: TableKind::Vertex,
                store,
            }) => Some(store),
            _ => None,
        }
    }

    /// Records the edge `source_id -> destination_id` in the declared edge
    /// table `source_type -> destination_type`.
    ///
    /// The edge row is `{source_type: source_id, destination_type:
    /// destination_id}` keyed by [`edge_key`]; a second relation between the
    /// same pair of ids overwrites the first. Both type names join the edge
    /// table's field set. Returns the edge key, or `None` if the edge table
    /// was never declared.
    pub fn insert_edge(
        &mut self,
        source_type: &str,
        source_id: &str,
        destination_type: &str,
        destination_id: &str,
    ) -> Option<String> {
        let name = edge_table_name(source_type, destination_type);
        let store = match self.tables.get_mut(&name) {
            Some(Table {
                kind: TableKind::Edge(_),
                store,
            }) => store,
            _ => return None,
        };

        let key = edge_key(source_id, destination_id);
        let mut attributes = Attributes::new();
        attributes.insert(source_type.to_string(), Value::String(source_id.to_string()));
        attributes.insert(
            destination_type.to_string(),
            Value::String(destination_id.to_string()),
        );
        store.insert(key.clone(), attributes);

        let fields = self.edge_fields.entry(name).or_default();
        fields.insert(source_type.to_string());
        fields.insert(destination_type.to_string());
        Some(key)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn vertex_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values().filter(|t| t.kind.is_vertex())
    }

    pub fn edge_tables(&self) -> impl Iterator<Item = (&EdgeEndpoints, &Table)> {
        self.tables
            .values()
            .filter_map(|t| t.kind.endpoints().map(|e| (e, t)))
    }

    /// Join fields observed for an edge table; `None` for vertex tables.
    pub fn edge_fields(&self, table_name: &str) -> Option<&BTreeSet<String>> {
        self.edge_fields.get(table_name)
    }

    pub fn edge_field_map(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.edge_fields
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
