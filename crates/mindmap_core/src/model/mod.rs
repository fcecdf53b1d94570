//! Domain model for normalized nodes and raw workspace records.
//!
//! # Responsibility
//! - Define the single node shape shared by every view (tree, matrix, roadmap).
//! - Describe the raw record shapes accepted at the input boundary.
//!
//! # Invariants
//! - Node identity is owned by `NodeMap`; ids are canonicalized on creation.

pub mod node;
pub mod record;
