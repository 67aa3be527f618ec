//! # Bookswap Cache
//!
//! Redis-backed response caching for the Bookswap API.
//!
//! This crate provides:
//! - Deterministic cache keys built from request parameters
//! - A [`KeyValueStore`] abstraction with a Redis implementation that
//!   reconnects in the background
//! - [`CacheService`], which degrades every operation to a no-op while the
//!   store is unreachable
//! - Read-through middleware for GET routes
//! - Pattern invalidation helpers for write paths
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bookswap_cache::{CacheConfig, CacheParams, CacheService, RedisStore};
//!
//! let config = CacheConfig::from_env();
//! let store = RedisStore::connect(&config).await?;
//! let cache = CacheService::new(Arc::new(store), &config);
//!
//! let key = cache.build_key(&CacheParams::new().with("url", "/api/books").with("page", 1));
//! cache.set(&key, &books).await;
//! let cached: Option<Vec<Book>> = cache.get(&key).await;
//! ```

pub mod config;
pub mod keys;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod middleware;
pub mod redis;
pub mod service;
pub mod store;

pub use config::{CacheConfig, ReconnectPolicy};
pub use keys::{CacheParams, ParamValue, build_key, invalidate};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use middleware::{ReadThroughCache, read_through};
pub use self::redis::RedisStore;
pub use service::CacheService;
pub use store::{CacheError, KeyValueStore, ScanPage};
