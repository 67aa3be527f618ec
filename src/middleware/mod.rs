//! Request extractors for authentication.
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `AuthUser` extractor validates the JWT and extracts claims
//! 3. Handlers check the role where an operation is owner-only
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//!
//! async fn create_book(auth_user: AuthUser) -> Result<impl IntoResponse, AppError> {
//!     auth_user.require_owner()?;
//!     let owner_id = auth_user.user_id()?;
//!     // ...
//! }
//! ```

pub mod auth;
