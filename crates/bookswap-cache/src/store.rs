//! Key-value store abstraction behind the cache.
//!
//! Anything offering `GET`, `SETEX`, `DEL` and a cursor-based `SCAN` with a
//! glob `MATCH` can back the cache.

use std::time::Duration;

use async_trait::async_trait;

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store unavailable")]
    Unavailable,

    #[error("Failed to read cached value for {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write cache entry {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: Box<CacheError>,
    },

    #[error("Invalidation of {pattern} stopped after {deleted} deletions: {source}")]
    Invalidation {
        pattern: String,
        deleted: u64,
        #[source]
        source: Box<CacheError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid key pattern {pattern}: {reason}")]
    Pattern { pattern: String, reason: String },
}

impl CacheError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Unavailable => "unavailable",
            CacheError::Read { .. } => "read",
            CacheError::Write { .. } => "write",
            CacheError::Invalidation { .. } => "invalidation",
            CacheError::Serialization(_) => "serialization",
            CacheError::Redis(_) => "redis",
            CacheError::Timeout(_) => "timeout",
            CacheError::Pattern { .. } => "pattern",
        }
    }
}

/// One page of a cursor scan. A `cursor` of `0` means the scan is complete.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanPage {
    pub cursor: u64,
    pub keys: Vec<String>,
}

/// Minimal key-value store contract used by [`crate::CacheService`].
///
/// Implementations must not block waiting for a connection: when the store
/// is down, [`is_connected`](KeyValueStore::is_connected) returns `false`
/// and calls fail fast with [`CacheError::Unavailable`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Cheap liveness check consulted before every operation.
    fn is_connected(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes a key, returning how many keys were removed.
    async fn del(&self, key: &str) -> Result<u64, CacheError>;

    /// Returns the next page of keys matching `pattern`, starting at `cursor`.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize)
    -> Result<ScanPage, CacheError>;
}
