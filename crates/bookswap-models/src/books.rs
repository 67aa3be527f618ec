//! Book listing models.
//!
//! A [`Book`] is a single listing owned by a user. Read endpoints return
//! [`BookWithOwner`], which adds the owner's public contact summary.

use bookswap_core::{PageParams, PaginationMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A book listing as stored in the database.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub location: String,
    pub contact_info: Option<String>,
    pub cover_image_url: Option<String>,
    pub is_available: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public summary of a listing's owner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct BookWithOwner {
    #[serde(flatten)]
    pub book: Book,
    pub owner: Owner,
}

/// Row shape of `books JOIN users`, with owner columns aliased `owner_*`.
#[derive(FromRow, Debug, Clone)]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub location: String,
    pub contact_info: Option<String>,
    pub cover_image_url: Option<String>,
    pub is_available: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_mobile: Option<String>,
}

impl From<BookRow> for BookWithOwner {
    fn from(row: BookRow) -> Self {
        Self {
            owner: Owner {
                id: row.owner_id,
                name: row.owner_name,
                email: row.owner_email,
                mobile: row.owner_mobile,
            },
            book: Book {
                id: row.id,
                title: row.title,
                author: row.author,
                genre: row.genre,
                location: row.location,
                contact_info: row.contact_info,
                cover_image_url: row.cover_image_url,
                is_available: row.is_available,
                owner_id: row.owner_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateBookDto {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    pub genre: Option<String>,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    pub contact_info: Option<String>,
    #[validate(url(message = "cover_image_url must be a valid URL"))]
    pub cover_image_url: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateBookDto {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "author cannot be empty"))]
    pub author: Option<String>,
    pub genre: Option<String>,
    #[validate(length(min = 1, message = "location cannot be empty"))]
    pub location: Option<String>,
    pub contact_info: Option<String>,
    #[validate(url(message = "cover_image_url must be a valid URL"))]
    pub cover_image_url: Option<String>,
    pub is_available: Option<bool>,
}

impl UpdateBookDto {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.location.is_none()
            && self.contact_info.is_none()
            && self.cover_image_url.is_none()
            && self.is_available.is_none()
    }
}

/// Raw query parameters accepted by the list and search endpoints.
#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
pub struct BookFilters {
    pub query: Option<String>,
    pub genre: Option<String>,
    pub location: Option<String>,
    /// `"true"` selects available books, any other value unavailable ones
    pub is_available: Option<String>,
    #[serde(flatten)]
    pub pagination: PageParams,
}

/// Normalised search criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSearch {
    pub query: Option<String>,
    pub genre: Option<String>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
    pub page: i64,
    pub limit: i64,
}

fn non_empty_trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl BookFilters {
    /// Trims text filters, drops empty ones and the `all` genre, and clamps
    /// pagination.
    pub fn normalize(&self) -> BookSearch {
        BookSearch {
            query: non_empty_trimmed(self.query.as_deref()),
            genre: non_empty_trimmed(self.genre.as_deref()).filter(|g| g != "all"),
            location: non_empty_trimmed(self.location.as_deref()),
            is_available: self.is_available.as_deref().map(|v| v == "true"),
            page: self.pagination.page(),
            limit: self.pagination.limit(),
        }
    }
}

impl BookSearch {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn filters(&self) -> AppliedFilters {
        AppliedFilters {
            genre: self.genre.clone(),
            location: self.location.clone(),
            is_available: self.is_available,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct AppliedFilters {
    pub genre: Option<String>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<BookWithOwner>,
    pub pagination: PaginationMeta,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct BookSearchResponse {
    pub books: Vec<BookWithOwner>,
    pub query: Option<String>,
    pub filters: AppliedFilters,
    pub pagination: PaginationMeta,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct OwnerBooksResponse {
    pub books: Vec<Book>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
