//! # Bookswap DB
//!
//! PostgreSQL pool initialisation.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: `10`)
//!
//! # Example
//!
//! ```ignore
//! use bookswap_db::init_db_pool;
//!
//! let pool = init_db_pool().await?;
//! ```

use std::env;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;

/// Opens the pool described by `DATABASE_URL`.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` when `DATABASE_URL` is unset and the
/// connection error when the database cannot be reached.
pub async fn init_db_pool() -> Result<PgPool, sqlx::Error> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| sqlx::Error::Configuration("DATABASE_URL must be set".into()))?;

    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await?;

    info!(db.max_connections = max_connections, "Database pool ready");

    Ok(pool)
}
