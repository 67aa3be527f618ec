//! In-process store for tests.
//!
//! Behaves like Redis for the commands the cache uses, including expiry and
//! glob `SCAN`. Expiry follows `tokio::time`, so tests can drive it with a
//! paused clock. Connectivity and per-key delete failures can be toggled to
//! exercise degraded paths.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use globset::Glob;
use tokio::time::Instant;

use crate::store::{CacheError, KeyValueStore, ScanPage};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    connected: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
    // Remaining keys of in-flight scans, by cursor.
    cursors: DashMap<u64, Vec<String>>,
    next_cursor: AtomicU64,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            connected: AtomicBool::new(true),
            failing_keys: Mutex::new(HashSet::new()),
            cursors: DashMap::new(),
            next_cursor: AtomicU64::new(1),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Makes every `DEL` of `key` fail.
    pub fn fail_deletes_for(&self, key: impl Into<String>) {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.insert(key.into());
        }
    }

    /// Number of `GET` calls that reached the store.
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `SETEX` calls that reached the store.
    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Raw stored value, ignoring expiry.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Stores a value without going through serialization.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.expires_at > now)
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn ensure_connected(&self) -> Result<(), CacheError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(CacheError::Unavailable)
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_connected()?;
        self.gets.fetch_add(1, Ordering::SeqCst);

        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }

        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_connected()?;
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.insert_raw(key, value, ttl.max(Duration::from_secs(1)));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<u64, CacheError> {
        self.ensure_connected()?;

        let failing = self
            .failing_keys
            .lock()
            .map(|keys| keys.contains(key))
            .unwrap_or(false);
        if failing {
            return Err(CacheError::Timeout(Duration::ZERO));
        }

        Ok(self.entries.remove(key).map_or(0, |_| 1))
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage, CacheError> {
        self.ensure_connected()?;

        let remaining = if cursor == 0 {
            let matcher = Glob::new(pattern)
                .map_err(|e| CacheError::Pattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?
                .compile_matcher();

            self.keys()
                .into_iter()
                .filter(|k| matcher.is_match(k.as_str()))
                .collect()
        } else {
            self.cursors
                .remove(&cursor)
                .map(|(_, keys)| keys)
                .unwrap_or_default()
        };

        // Snapshot semantics: keys deleted mid-scan do not shift later pages.
        let mut keys = remaining;
        let rest = keys.split_off(count.max(1).min(keys.len()));
        let next = if rest.is_empty() {
            0
        } else {
            let id = self.next_cursor.fetch_add(1, Ordering::SeqCst);
            self.cursors.insert(id, rest);
            id
        };

        Ok(ScanPage { cursor: next, keys })
    }
}
