//! # Bookswap Core
//!
//! Core types shared across the Bookswap API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page-based pagination parameters and response metadata
//!
//! # Example
//!
//! ```ignore
//! use bookswap_core::{AppError, PageParams, PaginationMeta};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Book not found"));
//!
//! let params = PageParams::default();
//! let meta = PaginationMeta::new(total, params.page(), params.limit());
//! ```

pub mod errors;
pub mod pagination;

pub use errors::{AppError, ErrorResponse};
pub use pagination::{PageParams, PaginationMeta};
