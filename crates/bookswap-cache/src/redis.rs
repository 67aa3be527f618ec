//! Redis-backed [`KeyValueStore`].
//!
//! The connection is opened once at startup and shared by every request.
//! A background task re-establishes it after connection-class failures,
//! following the configured [`ReconnectPolicy`]. While the link is down
//! operations fail fast with [`CacheError::Unavailable`] instead of waiting.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError, RedisResult, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{CacheConfig, ReconnectPolicy};
use crate::store::{CacheError, KeyValueStore, ScanPage};

/// Redis store shared across the process.
#[derive(Clone)]
pub struct RedisStore {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    conn: RwLock<Option<MultiplexedConnection>>,
    connected: AtomicBool,
    reconnecting: AtomicBool,
    policy: ReconnectPolicy,
    op_timeout: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connected", &self.is_connected())
            .field("policy", &self.inner.policy)
            .field("op_timeout", &self.inner.op_timeout)
            .finish_non_exhaustive()
    }
}

fn is_connection_error(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal()
}

impl Inner {
    async fn open_connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let conn = tokio::time::timeout(
            self.op_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| CacheError::Timeout(self.op_timeout))??;

        Ok(conn)
    }

    async fn install(&self, conn: MultiplexedConnection) {
        *self.conn.write().await = Some(conn);
        self.connected.store(true, Ordering::Release);
    }
}

impl RedisStore {
    /// Opens the Redis client and makes a first connection attempt.
    ///
    /// A failed first attempt is not an error: the store starts
    /// disconnected and keeps retrying in the background.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the URL cannot be parsed.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;

        let store = Self {
            inner: Arc::new(Inner {
                client,
                conn: RwLock::new(None),
                connected: AtomicBool::new(false),
                reconnecting: AtomicBool::new(false),
                policy: config.reconnect,
                op_timeout: config.operation_timeout,
            }),
        };

        match store.inner.open_connection().await {
            Ok(conn) => {
                store.inner.install(conn).await;
                info!("Connected to Redis");
            }
            Err(e) => {
                warn!(error = %e, "Initial Redis connection failed, retrying in background");
                store.spawn_reconnect();
            }
        }

        Ok(store)
    }

    /// Starts the reconnect supervisor unless one is already running.
    fn spawn_reconnect(&self) {
        if self.inner.reconnecting.swap(true, Ordering::AcqRel) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut attempt = 1;

            while let Some(delay) = inner.policy.delay_for(attempt) {
                tokio::time::sleep(delay).await;
                info!(attempt, "Redis client reconnecting");

                match inner.open_connection().await {
                    Ok(conn) => {
                        inner.install(conn).await;
                        inner.reconnecting.store(false, Ordering::Release);
                        info!(attempt, "Redis connection re-established");
                        return;
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Redis reconnect attempt failed");
                    }
                }

                attempt += 1;
            }

            error!(
                attempts = inner.policy.max_attempts,
                "Redis connection failed after retries, cache disabled"
            );
            inner.reconnecting.store(false, Ordering::Release);
        });
    }

    fn mark_disconnected(&self, err: &RedisError) {
        if self.inner.connected.swap(false, Ordering::AcqRel) {
            error!(error = %err, "Redis connection lost");
            self.spawn_reconnect();
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if !self.is_connected() {
            return Err(CacheError::Unavailable);
        }

        self.inner
            .conn
            .read()
            .await
            .clone()
            .ok_or(CacheError::Unavailable)
    }

    /// Runs one command under the operation timeout.
    async fn run<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.inner.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if is_connection_error(&e) {
                    self.mark_disconnected(&e);
                }
                Err(e.into())
            }
            Err(_) => Err(CacheError::Timeout(self.inner.op_timeout)),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        self.run(conn.get::<_, Option<String>>(key)).await
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);

        self.run(conn.set_ex::<_, _, ()>(key, value, seconds)).await?;
        debug!(cache.key = %key, cache.ttl_secs = %seconds, "Cache set");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn del(&self, key: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        self.run(conn.del::<_, u64>(key)).await
    }

    #[instrument(skip(self), fields(cache.operation = "SCAN"))]
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage, CacheError> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count);

        let (cursor, keys): (u64, Vec<String>) = self.run(cmd.query_async(&mut conn)).await?;

        Ok(ScanPage { cursor, keys })
    }
}
