//! # Bookswap Auth
//!
//! Access token claims and JWT helpers.
//!
//! Tokens are issued by the identity service in front of this API; this
//! crate verifies them and can mint tokens signed with the same secret for
//! local tooling and tests.
//!
//! # Example
//!
//! ```ignore
//! use bookswap_auth::{create_access_token, verify_token};
//! use bookswap_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "reader@example.com", "OWNER", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
