//! Hierarchy reconstruction from loosely related records.
//!
//! # Responsibility
//! - Repair parent/child links (`resolver`).
//! - Select a root and derive the reachable tree (`builder`).
//!
//! # Invariants
//! - Resolution only ever adds links; tree building only filters and copies.

pub mod adjacency;
pub mod builder;
pub mod resolver;

pub use adjacency::Adjacency;
pub use builder::{build_tree, find_root, Tree, TreeOptions};
pub use resolver::{resolve_relationships, ResolutionReport};
