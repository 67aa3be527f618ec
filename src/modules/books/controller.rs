use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use bookswap_core::AppError;
use bookswap_models::{
    Book, BookFilters, BookListResponse, BookSearchResponse, BookWithOwner, CreateBookDto,
    MessageResponse, UpdateBookDto,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::BookService;

fn parse_filters(
    filters: Result<Query<BookFilters>, QueryRejection>,
) -> Result<BookFilters, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    Ok(filters)
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("query" = Option<String>, Query, description = "Text matched against title, author, genre and location"),
        ("genre" = Option<String>, Query, description = "Genre (partial match, `all` for any)"),
        ("location" = Option<String>, Query, description = "Location (partial match)"),
        ("is_available" = Option<String>, Query, description = "`true` for available books, anything else for unavailable"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Paginated book listings", body = BookListResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    filters: Result<Query<BookFilters>, QueryRejection>,
) -> Result<Json<BookListResponse>, AppError> {
    let search = parse_filters(filters)?.normalize();
    let books = BookService::list_books(&state.db, &search).await?;
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/api/books/search",
    params(
        ("query" = Option<String>, Query, description = "Text matched against title, author, genre and location"),
        ("genre" = Option<String>, Query, description = "Genre (partial match, `all` for any)"),
        ("location" = Option<String>, Query, description = "Location (partial match)"),
        ("is_available" = Option<String>, Query, description = "`true` for available books, anything else for unavailable"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Search results with the applied filters", body = BookSearchResponse),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Books"
)]
pub async fn search_books(
    State(state): State<AppState>,
    filters: Result<Query<BookFilters>, QueryRejection>,
) -> Result<Json<BookSearchResponse>, AppError> {
    let search = parse_filters(filters)?.normalize();
    let results = BookService::search_books(&state.db, &search).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book with owner details", body = BookWithOwner),
        (status = 404, description = "Book not found")
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookWithOwner>, AppError> {
    let book = BookService::get_book(&state.db, id).await?;
    Ok(Json(book))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookDto,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - owners only"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Books",
    security(("bearer_auth" = []))
)]
pub async fn create_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateBookDto>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    auth_user.require_owner()?;
    let owner_id = auth_user.user_id()?;

    let book = BookService::create_book(&state.db, state.cache(), owner_id, dto).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateBookDto,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this book"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Books",
    security(("bearer_auth" = []))
)]
pub async fn update_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateBookDto>,
) -> Result<Json<Book>, AppError> {
    let user_id = auth_user.user_id()?;

    let book = BookService::update_book(&state.db, state.cache(), user_id, id, dto).await?;
    Ok(Json(book))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this book"),
        (status = 404, description = "Book not found")
    ),
    tag = "Books",
    security(("bearer_auth" = []))
)]
pub async fn delete_book(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = auth_user.user_id()?;

    BookService::delete_book(&state.db, state.cache(), user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}
