//! SQLite-backed page cache.
//!
//! # Invariants
//! - The connection must come from `db::open_db*` so the `page_cache` table exists.
//! - Payloads are JSON-encoded `Vec<RawRecord>`.

use super::{
    expiry_ms, is_expired, now_epoch_ms, CacheError, CacheResult, CachedBatch, PageCache,
};
use crate::model::record::RawRecord;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;

pub struct SqlitePageCache<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePageCache<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Deletes every entry expired at the current time. Returns the count.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM page_cache WHERE expires_at IS NOT NULL AND expires_at <= ?1;",
            params![now_epoch_ms()],
        )?;
        debug!(
            "event=cache_purge module=cache status=ok backend=sqlite removed={}",
            removed
        );
        Ok(removed)
    }
}

impl PageCache for SqlitePageCache<'_> {
    fn get(&self, key: &str) -> CacheResult<Option<CachedBatch>> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, fetched_at, expires_at FROM page_cache WHERE cache_key = ?1;",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((payload, fetched_at_ms, expires_at_ms)) = row else {
            return Ok(None);
        };
        if is_expired(expires_at_ms, now_epoch_ms()) {
            debug!("event=cache_get module=cache status=ok backend=sqlite outcome=expired");
            return Ok(None);
        }

        let records: Vec<RawRecord> = serde_json::from_str(&payload).map_err(|err| {
            warn!(
                "event=cache_get module=cache status=error backend=sqlite error_code=invalid_payload"
            );
            CacheError::InvalidData(format!("payload for `{key}` does not decode: {err}"))
        })?;
        Ok(Some(CachedBatch {
            records,
            fetched_at_ms,
        }))
    }

    fn put(&self, key: &str, batch: &CachedBatch, ttl: Option<Duration>) -> CacheResult<()> {
        let payload = serde_json::to_string(&batch.records).map_err(CacheError::Encode)?;
        self.conn.execute(
            "INSERT INTO page_cache (cache_key, payload, fetched_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cache_key) DO UPDATE SET
                payload = excluded.payload,
                fetched_at = excluded.fetched_at,
                expires_at = excluded.expires_at;",
            params![
                key,
                payload,
                batch.fetched_at_ms,
                expiry_ms(now_epoch_ms(), ttl)
            ],
        )?;
        debug!(
            "event=cache_put module=cache status=ok backend=sqlite records={}",
            batch.records.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.conn
            .execute("DELETE FROM page_cache WHERE cache_key = ?1;", params![key])?;
        Ok(())
    }
}
