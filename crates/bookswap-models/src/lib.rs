//! # Bookswap Models
//!
//! Database rows, request DTOs and response bodies.
//!
//! - [`books`]: Listings, owner summaries, search filters
//! - [`users`]: Profiles and roles

pub mod books;
pub mod users;

pub use books::{
    AppliedFilters, Book, BookFilters, BookListResponse, BookRow, BookSearch, BookSearchResponse,
    BookWithOwner, CreateBookDto, MessageResponse, Owner, OwnerBooksResponse, UpdateBookDto,
};
pub use users::{UpdateProfileDto, UserProfile, roles};
