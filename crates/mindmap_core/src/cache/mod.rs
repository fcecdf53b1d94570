//! Page cache collaborator.
//!
//! # Responsibility
//! - Keep fetched raw record batches per collection key with optional expiry.
//! - Let callers choose process-local or SQLite-backed storage.
//!
//! # Invariants
//! - Expired entries read as `None`.
//! - Payloads that fail to decode surface as `CacheError::InvalidData`.
//! - Algorithms never depend on cache state; the cache only feeds inputs.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryPageCache;
pub use sqlite::SqlitePageCache;

use crate::db::DbError;
use crate::model::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    Encode(serde_json::Error),
    InvalidData(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode cache payload: {err}"),
            Self::InvalidData(message) => write!(f, "invalid cached data: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One cached fetch of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBatch {
    pub records: Vec<RawRecord>,
    /// Unix epoch milliseconds of the fetch.
    pub fetched_at_ms: i64,
}

impl CachedBatch {
    /// Wraps records fetched just now.
    pub fn fetched_now(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            fetched_at_ms: now_epoch_ms(),
        }
    }
}

/// Storage contract for raw record batches.
pub trait PageCache {
    fn get(&self, key: &str) -> CacheResult<Option<CachedBatch>>;
    /// Stores `batch` under `key`, replacing any previous entry. `ttl = None`
    /// keeps it until removed.
    fn put(&self, key: &str, batch: &CachedBatch, ttl: Option<Duration>) -> CacheResult<()>;
    fn remove(&self, key: &str) -> CacheResult<()>;
}

impl<C: PageCache + ?Sized> PageCache for &C {
    fn get(&self, key: &str) -> CacheResult<Option<CachedBatch>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, batch: &CachedBatch, ttl: Option<Duration>) -> CacheResult<()> {
        (**self).put(key, batch, ttl)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key)
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

/// Absolute expiry for a TTL starting at `now_ms`.
pub(crate) fn expiry_ms(now_ms: i64, ttl: Option<Duration>) -> Option<i64> {
    ttl.map(|ttl| {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_add(ttl_ms)
    })
}

pub(crate) fn is_expired(expires_at_ms: Option<i64>, now_ms: i64) -> bool {
    expires_at_ms.is_some_and(|expires_at| expires_at <= now_ms)
}
