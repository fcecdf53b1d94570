//! Process-local page cache.

use super::{expiry_ms, is_expired, now_epoch_ms, CacheResult, CachedBatch, PageCache};
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct Entry {
    batch: CachedBatch,
    expires_at_ms: Option<i64>,
}

/// Mutex-guarded map; expired entries are dropped lazily on read.
#[derive(Default)]
pub struct InMemoryPageCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Entries stay consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PageCache for InMemoryPageCache {
    fn get(&self, key: &str) -> CacheResult<Option<CachedBatch>> {
        let mut entries = self.lock();
        let expired = entries
            .get(key)
            .is_some_and(|entry| is_expired(entry.expires_at_ms, now_epoch_ms()));
        if expired {
            entries.remove(key);
            debug!("event=cache_get module=cache status=ok backend=memory outcome=expired");
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.batch.clone()))
    }

    fn put(&self, key: &str, batch: &CachedBatch, ttl: Option<Duration>) -> CacheResult<()> {
        let entry = Entry {
            batch: batch.clone(),
            expires_at_ms: expiry_ms(now_epoch_ms(), ttl),
        };
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}
