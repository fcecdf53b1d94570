//! Core of the workspace mind map client.
//! Normalizes exported records into nodes, repairs their hierarchy and lays
//! the result out for tree, radial, roadmap and matrix views.

pub mod cache;
pub mod db;
pub mod hierarchy;
pub mod ingest;
pub mod layout;
pub mod logging;
pub mod model;
pub mod service;

pub use cache::{CacheError, CacheResult, CachedBatch, InMemoryPageCache, PageCache, SqlitePageCache};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use hierarchy::{build_tree, resolve_relationships, ResolutionReport, Tree, TreeOptions};
pub use ingest::{normalize_batch, normalize_record, parse_records_json, IngestError};
pub use layout::{
    LayoutConfig, LayoutDiagnostic, LayoutEdge, LayoutEngine, LayoutError, LayoutKind,
    LayoutResult, Position, PositionedNode, Quadrant,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::node::{
    CollectionKind, Node, NodeId, NodeMap, NodeStatus, ParseCollectionError, Priority,
};
pub use model::record::{concat_pages, QueryPage, RawRecord};
pub use service::{MapService, ServiceConfig, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
