//! Per-table handoff to a serving layer.
//!
//! A serving layer receives, per table, the bulk rows and, for edge tables,
//! the join-field map (field name -> field name). A missing field map marks a
//! vertex table.

use crate::catalog::{Catalog, Table, TableKind};
use crate::store::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableHandoff {
    pub name: String,
    #[serde(flatten)]
    pub kind: TableKind,
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_map: Option<BTreeMap<String, String>>,
}

impl TableHandoff {
    pub fn is_edge_table(&self) -> bool {
        self.field_map.is_some()
    }
}

impl Catalog {
    /// Snapshot of one table, or `None` if no such table exists.
    pub fn handoff(&self, name: &str) -> Option<TableHandoff> {
        self.table(name).map(|table| self.handoff_for(table))
    }

    /// Snapshots of every table, in name order.
    pub fn handoffs(&self) -> Vec<TableHandoff> {
        self.tables().map(|table| self.handoff_for(table)).collect()
    }

    fn handoff_for(&self, table: &Table) -> TableHandoff {
        let field_map = match table.kind() {
            TableKind::Vertex => None,
            TableKind::Edge(_) => Some(
                self.edge_fields(table.name())
                    .into_iter()
                    .flatten()
                    .map(|field| (field.clone(), field.clone()))
                    .collect(),
            ),
        };
        TableHandoff {
            name: table.name().to_string(),
            kind: table.kind().clone(),
            rows: table.store().export(),
            field_map,
        }
    }
}
