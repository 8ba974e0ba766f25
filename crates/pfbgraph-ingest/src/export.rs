//! Graph-config document describing the loaded tables for a query layer.
//!
//! ```json
//! {
//!   "vertices": {"case/": {"source": "pfb", "label": "case", "collection": "case"}},
//!   "edges": {"case-subject": {
//!     "fromVertex": "case/", "toVertex": "subject/", "label": "subject",
//!     "edgeTable": {"source": "pfb", "collection": "case:subject",
//!                   "fromField": "$.case", "toField": "$.subject"}}}
//! }
//! ```

use crate::catalog::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source name written into the document when the config does not set one.
pub const DEFAULT_SOURCE: &str = "pfb";

/// Vertex reference used as the `vertices` key and in `fromVertex`/`toVertex`.
pub fn vertex_id(table: &str) -> String {
    format!("{table}/")
}

pub fn edge_id(source: &str, destination: &str) -> String {
    format!("{source}-{destination}")
}

/// JSON path of a top-level field on an edge row.
pub fn field_path(field: &str) -> String {
    format!("$.{field}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub vertices: BTreeMap<String, VertexConfig>,
    pub edges: BTreeMap<String, EdgeConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexConfig {
    pub source: String,
    pub label: String,
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    pub from_vertex: String,
    pub to_vertex: String,
    pub label: String,
    pub edge_table: EdgeTableConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTableConfig {
    pub source: String,
    pub collection: String,
    pub from_field: String,
    pub to_field: String,
}

impl GraphConfig {
    /// One vertex entry per vertex table and one edge entry per edge table.
    pub fn from_catalog(catalog: &Catalog, source: &str) -> Self {
        let vertices = catalog
            .vertex_tables()
            .map(|table| {
                (
                    vertex_id(table.name()),
                    VertexConfig {
                        source: source.to_string(),
                        label: table.name().to_string(),
                        collection: table.name().to_string(),
                    },
                )
            })
            .collect();

        let edges = catalog
            .edge_tables()
            .map(|(endpoints, table)| {
                (
                    edge_id(&endpoints.source, &endpoints.destination),
                    EdgeConfig {
                        from_vertex: vertex_id(&endpoints.source),
                        to_vertex: vertex_id(&endpoints.destination),
                        label: endpoints.destination.clone(),
                        edge_table: EdgeTableConfig {
                            source: source.to_string(),
                            collection: table.name().to_string(),
                            from_field: field_path(&endpoints.source),
                            to_field: field_path(&endpoints.destination),
                        },
                    },
                )
            })
            .collect();

        Self { vertices, edges }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
