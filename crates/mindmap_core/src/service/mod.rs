//! Orchestration services.
//!
//! # Responsibility
//! - Chain normalize, resolve, build and layout for callers.
//! - Keep cache access out of the pure algorithm modules.

pub mod map_service;

pub use map_service::{cache_key, MapService, ServiceConfig, ServiceError};
