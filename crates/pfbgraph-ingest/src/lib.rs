//! PFB ingestion into vertex/edge tables.
//!
//! A PFB export is a stream of records whose first interesting record (the
//! `Metadata` record) declares the schema graph: entity types and the links
//! between them. Every later record is an entity instance carrying its
//! attributes and its relations. One pass over the stream produces:
//!
//! - one vertex table per declared entity type,
//! - one edge table per declared link, with rows keyed `"<src id>:<dst id>"`,
//! - the join fields observed on each edge table,
//!
//! and from those a graph-config document ([`export::GraphConfig`]) and
//! per-table handoffs ([`handoff::TableHandoff`]) for a serving layer.
//!
//! ```text
//! record stream ─► normalize ─► Router ─► Catalog ─┬─► GraphConfig
//!                                                  └─► TableHandoff (per table)
//! ```
//!
//! The load is all-or-nothing: a decode failure anywhere in the stream aborts
//! it and no catalog is returned. Records that merely do not fit are dropped,
//! logged at debug level, and counted in [`IngestStats`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod handoff;
pub mod normalize;
pub mod router;
pub mod source;
pub mod store;

#[cfg(feature = "avro")]
pub mod avro;

pub use catalog::{Catalog, EdgeEndpoints, Table, TableKind, TABLE_SEPARATOR};
pub use config::LoaderConfig;
pub use error::{IngestError, Result};
pub use export::GraphConfig;
pub use handoff::TableHandoff;
pub use normalize::{normalize, Normalizer, UnionTags};
pub use router::{IngestStats, RecordOutcome, Router, RouterState, SkipReason};
pub use source::{open_records, InputFormat, JsonRecordReader};
pub use store::{Attributes, EntityStore, Row};

use serde_json::Value;
use tracing::{info, warn};

/// Result of a completed ingestion pass.
#[derive(Debug, Clone)]
pub struct LoadedTables {
    pub catalog: Catalog,
    pub stats: IngestStats,
}

impl LoadedTables {
    pub fn graph_config(&self, source: &str) -> GraphConfig {
        GraphConfig::from_catalog(&self.catalog, source)
    }
}

/// Normalizes and routes every record of `records`, in order.
pub fn ingest_records<I>(records: I, normalizer: &Normalizer) -> Result<LoadedTables>
where
    I: IntoIterator<Item = Result<Value>>,
{
    let mut router = Router::new();
    for record in records {
        router.route(normalizer.normalize(record?));
    }
    let (catalog, stats) = router.finish();

    if catalog.is_empty() {
        warn!(records = stats.records, "no schema declaration found in stream");
    }
    if stats.has_drops() {
        warn!(
            skipped_records = stats.skipped_records,
            dropped_relations = stats.dropped_relations,
            "some records or relations were dropped"
        );
    }
    info!(
        tables = catalog.len(),
        vertex_rows = stats.vertex_rows,
        edge_rows = stats.edge_rows,
        "ingestion finished"
    );
    Ok(LoadedTables { catalog, stats })
}

/// Opens the configured input and ingests it.
pub fn load_tables(config: &LoaderConfig) -> Result<LoadedTables> {
    let format = config.input_format()?;
    info!(path = %config.path.display(), ?format, "loading tables");
    let records = open_records(&config.path, format)?;
    ingest_records(records, &config.normalizer())
}
