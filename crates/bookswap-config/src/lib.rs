//! # Bookswap Config
//!
//! Configuration types for the Bookswap API, loaded from environment
//! variables:
//!
//! - [`jwt`]: Bearer token verification settings
//! - [`cors`]: Allowed browser origins
//! - [`server`]: Listen address
//!
//! Cache settings live with the cache itself in `bookswap_cache::CacheConfig`.
//!
//! # Example
//!
//! ```ignore
//! use bookswap_config::{CorsConfig, JwtConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod server;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
