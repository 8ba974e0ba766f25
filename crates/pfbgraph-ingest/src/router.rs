//! Schema/instance router.
//!
//! The stream carries its own schema: one `Metadata` record lists every entity
//! type (node) and its declared links. The router creates the vertex and edge
//! tables when that record arrives and then files each instance record into
//! them. Records that arrive before the schema, or that reference types the
//! schema never declared, are dropped rather than queued.
//!
//! ```text
//!   AwaitingSchema ──(Metadata record)──► Ingesting ──(Metadata again: tables reset)─┐
//!        │                                   ▲                                      │
//!        └─ instances dropped                └──────────────────────────────────────┘
//! ```
//!
//! Record shapes (after normalization):
//!
//! - schema: `{"id": null, "name": "Metadata", "object": {"Metadata": {"nodes": [
//!   {"name": "<type>", "links": [{"dst": "<type>", ...}]}]}}}`
//! - instance: `{"id": "<id>", "name": "<type>", "object": {"<type>": {...}},
//!   "relations": [{"dst_name": "<type>", "dst_id": "<id>"}]}`

use crate::catalog::Catalog;
use crate::store::Attributes;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

/// `name` of the record that declares the schema graph.
pub const METADATA_RECORD_NAME: &str = "Metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    AwaitingSchema,
    Ingesting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    /// Neither a schema declaration nor an `id` + `name` instance.
    UnrecognizedShape,
    /// A `Metadata` record without an `object.Metadata.nodes` list.
    MalformedSchema,
    /// An instance of a type with no vertex table.
    UndeclaredType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Schema {
        vertex_tables: usize,
        edge_tables: usize,
    },
    Instance {
        table: String,
        key: String,
        /// False when the record had no `object.<type>` payload.
        vertex_row: bool,
        edges: usize,
        dropped_relations: usize,
    },
    Skipped(SkipReason),
}

/// Running counters for one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub records: usize,
    pub schema_records: usize,
    pub instance_records: usize,
    pub vertex_rows: usize,
    pub edge_rows: usize,
    pub skipped_records: usize,
    pub dropped_relations: usize,
}

impl IngestStats {
    pub fn has_drops(&self) -> bool {
        self.skipped_records > 0 || self.dropped_relations > 0
    }
}

#[derive(Debug)]
pub struct Router {
    catalog: Catalog,
    state: RouterState,
    stats: IngestStats,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            state: RouterState::AwaitingSchema,
            stats: IngestStats::default(),
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Ends the pass and hands over the catalog.
    pub fn finish(self) -> (Catalog, IngestStats) {
        (self.catalog, self.stats)
    }

    /// Routes one normalized record.
    pub fn route(&mut self, record: Value) -> RecordOutcome {
        self.stats.records += 1;
        let outcome = match record {
            Value::Object(record) => self.route_object(record),
            _ => RecordOutcome::Skipped(SkipReason::NotAnObject),
        };
        if let RecordOutcome::Skipped(reason) = &outcome {
            self.stats.skipped_records += 1;
            debug!(record = self.stats.records, ?reason, "skipping record");
        }
        outcome
    }

    fn route_object(&mut self, record: Map<String, Value>) -> RecordOutcome {
        let has_id = record.get("id").is_some_and(|id| !id.is_null());
        if !has_id && str_field(&record, "name") == Some(METADATA_RECORD_NAME) {
            return self.discover_schema(&record);
        }

        let (id, name) = match (str_field(&record, "id"), str_field(&record, "name")) {
            (Some(id), Some(name)) => (id.to_string(), name.to_string()),
            _ => return RecordOutcome::Skipped(SkipReason::UnrecognizedShape),
        };
        self.ingest_instance(id, name, record)
    }

    fn discover_schema(&mut self, record: &Map<String, Value>) -> RecordOutcome {
        let Some(nodes) = object_field(record, "object")
            .and_then(|object| object_field(object, METADATA_RECORD_NAME))
            .and_then(|metadata| array_field(metadata, "nodes"))
        else {
            warn!("metadata record has no node list");
            return RecordOutcome::Skipped(SkipReason::MalformedSchema);
        };

        let mut vertex_tables = 0;
        let mut edge_tables = 0;
        for node in nodes {
            let Some(node) = node.as_object() else {
                continue;
            };
            let Some(node_name) = str_field(node, "name") else {
                continue;
            };
            if !self.catalog.declare_vertex_table(node_name) {
                continue;
            }
            info!(table = node_name, "vertex table");
            vertex_tables += 1;

            for link in array_field(node, "links").into_iter().flatten() {
                let Some(dst) = link.as_object().and_then(|link| str_field(link, "dst")) else {
                    continue;
                };
                if let Some(edge_table) = self.catalog.declare_edge_table(node_name, dst) {
                    info!(table = %edge_table, "edge table");
                    edge_tables += 1;
                }
            }
        }

        self.state = RouterState::Ingesting;
        self.stats.schema_records += 1;
        RecordOutcome::Schema {
            vertex_tables,
            edge_tables,
        }
    }

    fn ingest_instance(
        &mut self,
        id: String,
        name: String,
        mut record: Map<String, Value>,
    ) -> RecordOutcome {
        if self.catalog.vertex_table_mut(&name).is_none() {
            return RecordOutcome::Skipped(SkipReason::UndeclaredType(name));
        }
        self.stats.instance_records += 1;

        let entity = match record.remove("object") {
            Some(Value::Object(mut object)) => match object.remove(&name) {
                Some(Value::Object(entity)) => Some(entity),
                _ => None,
            },
            _ => None,
        };
        let vertex_row = match (entity, self.catalog.vertex_table_mut(&name)) {
            (Some(entity), Some(table)) => {
                table.insert(id.clone(), entity);
                self.stats.vertex_rows += 1;
                true
            }
            _ => {
                debug!(%id, table = %name, "instance has no attribute payload");
                false
            }
        };

        let mut edges = 0;
        let mut dropped_relations = 0;
        for relation in array_field(&record, "relations").into_iter().flatten() {
            let endpoint = relation.as_object().and_then(|relation| {
                Some((
                    str_field(relation, "dst_name")?,
                    str_field(relation, "dst_id")?,
                ))
            });
            let Some((dst_name, dst_id)) = endpoint else {
                dropped_relations += 1;
                debug!(%id, table = %name, "relation without dst_name/dst_id");
                continue;
            };
            match self.catalog.insert_edge(&name, &id, dst_name, dst_id) {
                Some(key) => {
                    trace!(%key, "edge");
                    edges += 1;
                }
                None => {
                    dropped_relations += 1;
                    debug!(%id, src = %name, dst = dst_name, "relation to undeclared edge table");
                }
            }
        }
        self.stats.edge_rows += edges;
        self.stats.dropped_relations += dropped_relations;

        RecordOutcome::Instance {
            table: name,
            key: id,
            vertex_row,
            edges,
            dropped_relations,
        }
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn object_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Attributes> {
    map.get(key).and_then(Value::as_object)
}

fn array_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    map.get(key).and_then(Value::as_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(nodes: Value) -> Value {
        json!({"id": null, "name": "Metadata", "object": {"Metadata": {"nodes": nodes}}})
    }

    #[test]
    fn starts_awaiting_schema() {
        let router = Router::new();
        assert_eq!(router.state(), RouterState::AwaitingSchema);
        assert!(router.catalog().is_empty());
    }

    #[test]
    fn schema_record_creates_tables() {
        let mut router = Router::new();
        let outcome = router.route(schema(json!([
            {"name": "case", "links": [{"dst": "subject", "name": "subjects"}]},
            {"name": "subject", "links": []},
        ])));

        assert_eq!(
            outcome,
            RecordOutcome::Schema {
                vertex_tables: 2,
                edge_tables: 1
            }
        );
        assert_eq!(router.state(), RouterState::Ingesting);
        assert!(router.catalog().table("case").is_some());
        assert!(router.catalog().table("subject").is_some());
        assert!(router.catalog().table("case:subject").is_some());
    }

    #[test]
    fn metadata_name_with_id_is_an_instance() {
        let mut router = Router::new();
        let outcome = router.route(json!({"id": "m1", "name": "Metadata"}));
        assert_eq!(
            outcome,
            RecordOutcome::Skipped(SkipReason::UndeclaredType("Metadata".to_string()))
        );
    }

    #[test]
    fn metadata_without_nodes_is_skipped() {
        let mut router = Router::new();
        let outcome = router.route(json!({"name": "Metadata", "object": {}}));
        assert_eq!(outcome, RecordOutcome::Skipped(SkipReason::MalformedSchema));
        assert_eq!(router.state(), RouterState::AwaitingSchema);
    }

    #[test]
    fn unrecognized_records_are_skipped() {
        let mut router = Router::new();
        assert_eq!(
            router.route(json!([1, 2])),
            RecordOutcome::Skipped(SkipReason::NotAnObject)
        );
        assert_eq!(
            router.route(json!({"id": "x"})),
            RecordOutcome::Skipped(SkipReason::UnrecognizedShape)
        );
        assert_eq!(
            router.route(json!({"id": 5, "name": "case"})),
            RecordOutcome::Skipped(SkipReason::UnrecognizedShape)
        );
        assert_eq!(router.stats().skipped_records, 3);
    }

    #[test]
    fn instance_fills_vertex_and_edge_tables() {
        let mut router = Router::new();
        router.route(schema(json!([
            {"name": "A", "links": [{"dst": "B"}]},
            {"name": "B"},
        ])));
        let outcome = router.route(json!({
            "id": "a1",
            "name": "A",
            "object": {"A": {"size": 3}},
            "relations": [{"dst_name": "B", "dst_id": "b1"}]
        }));

        assert_eq!(
            outcome,
            RecordOutcome::Instance {
                table: "A".to_string(),
                key: "a1".to_string(),
                vertex_row: true,
                edges: 1,
                dropped_relations: 0,
            }
        );
        let a = router.catalog().table("A").unwrap().store();
        assert_eq!(a.get("a1").unwrap().get("size"), Some(&json!(3)));
        assert!(router.catalog().table("A:B").unwrap().store().get("a1:b1").is_some());
    }

    #[test]
    fn relations_survive_a_missing_payload() {
        let mut router = Router::new();
        router.route(schema(json!([{"name": "A", "links": [{"dst": "B"}]}])));
        let outcome = router.route(json!({
            "id": "a1",
            "name": "A",
            "relations": [{"dst_name": "B", "dst_id": "b1"}, {"dst_name": "C", "dst_id": "c1"}, 7]
        }));

        assert_eq!(
            outcome,
            RecordOutcome::Instance {
                table: "A".to_string(),
                key: "a1".to_string(),
                vertex_row: false,
                edges: 1,
                dropped_relations: 2,
            }
        );
        assert!(router.catalog().table("A").unwrap().store().is_empty());
        assert_eq!(router.stats().dropped_relations, 2);
        assert_eq!(router.stats().edge_rows, 1);
    }

    #[test]
    fn second_schema_resets_tables() {
        let mut router = Router::new();
        let nodes = json!([{"name": "A"}]);
        router.route(schema(nodes.clone()));
        router.route(json!({"id": "a1", "name": "A", "object": {"A": {}}}));
        assert_eq!(router.catalog().table("A").unwrap().store().len(), 1);

        router.route(schema(nodes));
        assert!(router.catalog().table("A").unwrap().store().is_empty());
        assert_eq!(router.stats().schema_records, 2);
    }
}
