//! Cache service wrapping a [`KeyValueStore`].
//!
//! Every call is best effort. A disconnected store, a store error, a timeout
//! or a corrupt payload is logged and then treated as a miss or a no-op, so
//! callers never branch on cache failures.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, instrument, warn};

use crate::config::CacheConfig;
use crate::keys::{CacheParams, build_key_with_prefix};
use crate::store::{CacheError, KeyValueStore};

/// Shared cache handle injected into application state.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    default_ttl: Duration,
    key_prefix: String,
    scan_count: usize,
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("default_ttl", &self.default_ttl)
            .field("key_prefix", &self.key_prefix)
            .field("connected", &self.store.is_connected())
            .finish_non_exhaustive()
    }
}

impl CacheService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            default_ttl: config.default_ttl(),
            key_prefix: config.key_prefix.clone(),
            scan_count: config.scan_count.max(1),
        }
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Builds a key under the configured prefix.
    pub fn build_key(&self, params: &CacheParams) -> String {
        build_key_with_prefix(&self.key_prefix, params)
    }

    /// Whether the underlying store is currently reachable.
    pub fn is_available(&self) -> bool {
        self.store.is_connected()
    }

    /// Gets a cached value.
    ///
    /// Returns `None` on a miss, when the store is down, or when the stored
    /// payload no longer deserializes into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                counter!("cache_lookups_total", "result" => "hit").increment(1);
                Some(value)
            }
            Ok(None) => {
                counter!("cache_lookups_total", "result" => "miss").increment(1);
                None
            }
            Err(CacheError::Unavailable) => {
                counter!("cache_lookups_total", "result" => "skipped").increment(1);
                None
            }
            Err(e) => {
                counter!("cache_lookups_total", "result" => "error").increment(1);
                error!(cache.key = %key, error = %e, error.kind = e.kind(), "Cache read failed");
                None
            }
        }
    }

    /// Stores a value with the default TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Stores a value with an explicit TTL. Failures are logged and dropped.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match self.try_set(key, value, ttl).await {
            Ok(()) => {
                counter!("cache_writes_total", "status" => "ok").increment(1);
            }
            Err(CacheError::Unavailable) => {
                counter!("cache_writes_total", "status" => "skipped").increment(1);
                debug!(cache.key = %key, "Cache unavailable, write skipped");
            }
            Err(e) => {
                counter!("cache_writes_total", "status" => "error").increment(1);
                error!(cache.key = %key, error = %e, "Cache write failed");
            }
        }
    }

    /// Deletes a single key.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn delete(&self, key: &str) {
        if !self.is_available() {
            return;
        }

        match self.store.del(key).await {
            Ok(_) => debug!(cache.key = %key, "Cache entry deleted"),
            Err(e) => error!(cache.key = %key, error = %e, "Failed to delete cache key"),
        }
    }

    /// Deletes every key matching a glob pattern, returning how many were
    /// removed.
    ///
    /// Keys are deleted one by one as the scan progresses. A failed delete is
    /// logged and the sweep continues; a failed scan ends it early. Entries
    /// left behind expire with their TTL.
    #[instrument(skip(self), fields(cache.operation = "INVALIDATE"))]
    pub async fn invalidate(&self, pattern: &str) -> u64 {
        match self.try_invalidate(pattern).await {
            Ok(deleted) => {
                counter!("cache_invalidated_keys_total").increment(deleted);
                debug!(cache.pattern = %pattern, deleted, "Cache pattern invalidated");
                deleted
            }
            Err(CacheError::Unavailable) => {
                debug!(cache.pattern = %pattern, "Cache unavailable, invalidation skipped");
                0
            }
            Err(CacheError::Invalidation {
                pattern,
                deleted,
                source,
            }) => {
                counter!("cache_invalidated_keys_total").increment(deleted);
                warn!(
                    cache.pattern = %pattern,
                    deleted,
                    error = %source,
                    "Cache invalidation stopped early"
                );
                deleted
            }
            Err(e) => {
                error!(cache.pattern = %pattern, error = %e, "Cache invalidation failed");
                0
            }
        }
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        if !self.is_available() {
            return Err(CacheError::Unavailable);
        }

        let Some(raw) = self.store.get(key).await? else {
            debug!(cache.key = %key, "Cache miss");
            return Ok(None);
        };

        let value = serde_json::from_str(&raw).map_err(|source| CacheError::Read {
            key: key.to_string(),
            source,
        })?;
        debug!(cache.key = %key, "Cache hit");

        Ok(Some(value))
    }

    #[instrument(skip(self, value), fields(cache.operation = "SET"))]
    async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if !self.is_available() {
            return Err(CacheError::Unavailable);
        }

        let write_err = |source: CacheError| CacheError::Write {
            key: key.to_string(),
            source: Box::new(source),
        };

        let payload = serde_json::to_string(value).map_err(|e| write_err(e.into()))?;
        self.store
            .set_ex(key, payload, ttl)
            .await
            .map_err(write_err)
    }

    async fn try_invalidate(&self, pattern: &str) -> Result<u64, CacheError> {
        if !self.is_available() {
            return Err(CacheError::Unavailable);
        }

        let mut cursor = 0u64;
        let mut deleted = 0u64;

        loop {
            let page = self
                .store
                .scan(cursor, pattern, self.scan_count)
                .await
                .map_err(|source| CacheError::Invalidation {
                    pattern: pattern.to_string(),
                    deleted,
                    source: Box::new(source),
                })?;

            for key in &page.keys {
                match self.store.del(key).await {
                    Ok(n) => deleted += n,
                    Err(e) => warn!(cache.key = %key, error = %e, "Failed to delete matched key"),
                }
            }

            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }
}
