//! Mind map use-case service.
//!
//! # Responsibility
//! - Turn raw record batches into resolved node maps and trees.
//! - Remember fetched batches through an injected `PageCache`.
//! - Assemble the related problems an objectives roadmap displays.
//!
//! # Invariants
//! - Cache failures never alter algorithm output; they surface as errors.
//! - The same records produce the same node map whether fresh or cached.

use crate::cache::{CacheError, CachedBatch, PageCache};
use crate::hierarchy::{build_tree, resolve_relationships, Tree, TreeOptions};
use crate::ingest::normalize_batch;
use crate::layout::{LayoutConfig, LayoutEngine, LayoutError, LayoutResult};
use crate::model::node::{CollectionKind, NodeMap};
use crate::model::record::RawRecord;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const CACHE_KEY_PREFIX: &str = "mindmap-data";

#[derive(Debug)]
pub enum ServiceError {
    Cache(CacheError),
    Layout(LayoutError),
    InvalidConfig(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache(err) => write!(f, "{err}"),
            Self::Layout(err) => write!(f, "{err}"),
            Self::InvalidConfig(message) => write!(f, "invalid service config: {message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cache(err) => Some(err),
            Self::Layout(err) => Some(err),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<CacheError> for ServiceError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl From<LayoutError> for ServiceError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

/// Per-deployment defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Cached batches expire after this many seconds; `None` keeps them.
    pub cache_ttl_secs: Option<u64>,
    pub problems_root_id: Option<String>,
    pub objectives_root_id: Option<String>,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.cache_ttl_secs == Some(0) {
            return Err(ServiceError::InvalidConfig(
                "cacheTtlSecs must be positive when set".to_string(),
            ));
        }
        let roots = [
            ("problemsRootId", &self.problems_root_id),
            ("objectivesRootId", &self.objectives_root_id),
        ];
        for (field, value) in roots {
            if value.as_deref().is_some_and(|id| id.trim().is_empty()) {
                return Err(ServiceError::InvalidConfig(format!("{field} cannot be blank")));
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn default_root(&self, collection: CollectionKind) -> Option<&str> {
        match collection {
            CollectionKind::Problems => self.problems_root_id.as_deref(),
            CollectionKind::Objectives => self.objectives_root_id.as_deref(),
            CollectionKind::Other => None,
        }
    }

    pub fn tree_options(&self, collection: CollectionKind) -> TreeOptions {
        let options = TreeOptions::for_collection(collection);
        match self.default_root(collection) {
            Some(root) => options.with_default_root(root),
            None => options,
        }
    }
}

/// Cache key a collection's batch is stored under.
pub fn cache_key(collection: CollectionKind) -> String {
    format!("{CACHE_KEY_PREFIX}-{collection}")
}

pub struct MapService<C: PageCache> {
    cache: C,
    config: ServiceConfig,
}

impl<C: PageCache> MapService<C> {
    pub fn new(cache: C, config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self { cache, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Normalizes and resolves `records`, then caches the raw batch.
    ///
    /// The node map is computed before the cache write, so a failed write
    /// loses nothing but the cache entry.
    pub fn ingest(
        &self,
        collection: CollectionKind,
        records: &[RawRecord],
    ) -> Result<NodeMap, ServiceError> {
        let nodes = prepare(collection, records);
        let batch = CachedBatch::fetched_now(records.to_vec());
        self.cache
            .put(&cache_key(collection), &batch, self.config.cache_ttl())
            .map_err(|err| {
                warn!(
                    "event=ingest module=service status=error collection={} error_code=cache_put_failed",
                    collection
                );
                ServiceError::from(err)
            })?;

        info!(
            "event=ingest module=service status=ok collection={} records={} nodes={}",
            collection,
            records.len(),
            nodes.len()
        );
        Ok(nodes)
    }

    /// Rebuilds a collection's node map from its cached batch.
    pub fn load_cached(&self, collection: CollectionKind) -> Result<Option<NodeMap>, ServiceError> {
        let Some(batch) = self.cache.get(&cache_key(collection))? else {
            info!(
                "event=load_cached module=service status=ok collection={} outcome=miss",
                collection
            );
            return Ok(None);
        };
        info!(
            "event=load_cached module=service status=ok collection={} outcome=hit records={} fetched_at_ms={}",
            collection,
            batch.records.len(),
            batch.fetched_at_ms
        );
        Ok(Some(prepare(collection, &batch.records)))
    }

    pub fn invalidate(&self, collection: CollectionKind) -> Result<(), ServiceError> {
        self.cache.remove(&cache_key(collection))?;
        Ok(())
    }

    /// Builds the tree; an explicit `root_id` beats the configured default.
    pub fn tree(&self, collection: CollectionKind, nodes: &NodeMap, root_id: Option<&str>) -> Tree {
        build_tree(nodes, root_id, &self.config.tree_options(collection))
    }

    pub fn layout(
        &self,
        tree: &Tree,
        config: LayoutConfig,
        related: Option<&NodeMap>,
    ) -> Result<LayoutResult, ServiceError> {
        let engine = LayoutEngine::new(config)?;
        Ok(engine.run(tree, related))
    }

    /// Cached problems referenced by `primary` through `problem_ids`, in
    /// cache order, tagged as non-objectives. Empty when nothing is cached.
    pub fn related_nodes(&self, primary: &NodeMap) -> Result<NodeMap, ServiceError> {
        let wanted: HashSet<&str> = primary
            .values()
            .flat_map(|node| node.problem_ids.iter().map(|id| id.as_str()))
            .collect();
        if wanted.is_empty() {
            return Ok(NodeMap::new());
        }
        let Some(problems) = self.load_cached(CollectionKind::Problems)? else {
            return Ok(NodeMap::new());
        };

        Ok(problems
            .values()
            .filter(|node| wanted.contains(node.id.as_str()))
            .cloned()
            .map(|mut node| {
                node.is_objective = false;
                node
            })
            .collect())
    }
}

fn prepare(collection: CollectionKind, records: &[RawRecord]) -> NodeMap {
    let mut nodes = normalize_batch(records, collection);
    resolve_relationships(&mut nodes);
    nodes
}

#[cfg(test)]
mod tests {
    use super::{cache_key, MapService, ServiceConfig, ServiceError};
    use crate::cache::InMemoryPageCache;
    use crate::model::node::CollectionKind;

    #[test]
    fn cache_key_is_stable_per_collection() {
        assert_eq!(cache_key(CollectionKind::Problems), "mindmap-data-problems");
        assert_eq!(cache_key(CollectionKind::Objectives), "mindmap-data-objectives");
    }

    #[test]
    fn zero_ttl_and_blank_roots_are_rejected() {
        let config = ServiceConfig {
            cache_ttl_secs: Some(0),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            MapService::new(InMemoryPageCache::new(), config),
            Err(ServiceError::InvalidConfig(_))
        ));

        let config = ServiceConfig {
            problems_root_id: Some("  ".to_string()),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn configured_root_feeds_tree_options() {
        let config = ServiceConfig {
            objectives_root_id: Some("abc".to_string()),
            ..ServiceConfig::default()
        };
        let options = config.tree_options(CollectionKind::Objectives);
        assert_eq!(options.default_root_id.as_deref(), Some("abc"));
        assert_eq!(config.tree_options(CollectionKind::Problems).default_root_id, None);
    }

    #[test]
    fn empty_cache_yields_no_related_nodes() {
        let service =
            MapService::new(InMemoryPageCache::new(), ServiceConfig::default()).expect("service");
        assert!(service
            .load_cached(CollectionKind::Problems)
            .expect("load")
            .is_none());
    }
}
