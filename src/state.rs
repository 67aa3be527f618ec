use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use bookswap_cache::{CacheConfig, CacheService, RedisStore};
use bookswap_config::cors::CorsConfig;
use bookswap_config::jwt::JwtConfig;
use bookswap_db::init_db_pool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub cache_config: CacheConfig,
    /// `None` when caching is disabled or Redis is misconfigured.
    pub cache: Option<CacheService>,
}

impl AppState {
    pub fn cache(&self) -> Option<&CacheService> {
        self.cache.as_ref()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = init_db_pool()
        .await
        .context("Failed to connect to database")?;

    let cache_config = CacheConfig::from_env();
    let cache = init_cache(&cache_config).await;

    Ok(AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        cache_config,
        cache,
    })
}

/// Connects the Redis store. An unreachable server still yields a cache
/// that reconnects in the background; only a disabled cache or an invalid
/// URL yields `None`.
pub async fn init_cache(config: &CacheConfig) -> Option<CacheService> {
    if !config.enabled {
        info!("Response cache disabled");
        return None;
    }

    match RedisStore::connect(config).await {
        Ok(store) => Some(CacheService::new(Arc::new(store), config)),
        Err(e) => {
            warn!(error = %e, "Invalid Redis configuration, continuing without cache");
            None
        }
    }
}
