use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use bookswap_cache::{CacheService, invalidate};
use bookswap_core::{AppError, PaginationMeta};
use bookswap_models::{
    Book, BookListResponse, BookRow, BookSearch, BookSearchResponse, BookWithOwner, CreateBookDto,
    UpdateBookDto,
};

use crate::metrics::track_book_mutation;

const BOOK_WITH_OWNER_COLUMNS: &str = "b.id, b.title, b.author, b.genre, b.location, \
     b.contact_info, b.cover_image_url, b.is_available, b.owner_id, b.created_at, b.updated_at, \
     u.name AS owner_name, u.email AS owner_email, u.mobile AS owner_mobile";

const BOOK_COLUMNS: &str = "id, title, author, genre, location, contact_info, cover_image_url, \
     is_available, owner_id, created_at, updated_at";

/// Escapes `LIKE` wildcards and wraps the term for a substring match.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// `WHERE` fragment over `books b` plus its text binds, in `$n` order.
pub(crate) fn filter_clause(search: &BookSearch) -> (String, Vec<String>) {
    let mut where_clause = String::new();
    let mut params = Vec::new();

    if let Some(query) = &search.query {
        params.push(like_pattern(query));
        let n = params.len();
        where_clause.push_str(&format!(
            " AND (b.title ILIKE ${n} OR b.author ILIKE ${n} OR b.genre ILIKE ${n} OR b.location ILIKE ${n})"
        ));
    }

    if let Some(genre) = &search.genre {
        params.push(like_pattern(genre));
        where_clause.push_str(&format!(" AND b.genre ILIKE ${}", params.len()));
    }

    if let Some(location) = &search.location {
        params.push(like_pattern(location));
        where_clause.push_str(&format!(" AND b.location ILIKE ${}", params.len()));
    }

    if let Some(is_available) = search.is_available {
        where_clause.push_str(if is_available {
            " AND b.is_available = TRUE"
        } else {
            " AND b.is_available = FALSE"
        });
    }

    (where_clause, params)
}

pub struct BookService;

impl BookService {
    async fn fetch_page(
        db: &PgPool,
        search: &BookSearch,
        order_by: &str,
    ) -> Result<(Vec<BookWithOwner>, PaginationMeta), AppError> {
        let (where_clause, params) = filter_clause(search);

        let count_query = format!("SELECT COUNT(*) FROM books b WHERE 1=1{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await.map_err(|e| {
            error!(error = %e, "Database error counting books");
            AppError::from(e)
        })?;

        let data_query = format!(
            "SELECT {BOOK_WITH_OWNER_COLUMNS} FROM books b JOIN users u ON u.id = b.owner_id \
             WHERE 1=1{where_clause} ORDER BY {order_by} LIMIT {} OFFSET {}",
            search.limit,
            search.offset()
        );
        let mut data_sql = sqlx::query_as::<_, BookRow>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let rows = data_sql.fetch_all(db).await.map_err(|e| {
            error!(error = %e, "Database error fetching books");
            AppError::from(e)
        })?;

        let books: Vec<BookWithOwner> = rows.into_iter().map(Into::into).collect();
        let meta = PaginationMeta::new(total, search.page, search.limit);

        debug!(
            total = %total,
            returned = %books.len(),
            has_more = %meta.has_more,
            "Books fetched"
        );

        Ok((books, meta))
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "books"))]
    pub async fn list_books(db: &PgPool, search: &BookSearch) -> Result<BookListResponse, AppError> {
        let (books, pagination) = Self::fetch_page(db, search, "b.updated_at DESC").await?;

        Ok(BookListResponse { books, pagination })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "books"))]
    pub async fn search_books(
        db: &PgPool,
        search: &BookSearch,
    ) -> Result<BookSearchResponse, AppError> {
        let (books, pagination) =
            Self::fetch_page(db, search, "b.updated_at DESC, b.title ASC").await?;

        Ok(BookSearchResponse {
            books,
            query: search.query.clone(),
            filters: search.filters(),
            pagination,
        })
    }

    #[instrument(skip(db), fields(book.id = %book_id, db.operation = "SELECT", db.table = "books"))]
    pub async fn get_book(db: &PgPool, book_id: Uuid) -> Result<BookWithOwner, AppError> {
        let query = format!(
            "SELECT {BOOK_WITH_OWNER_COLUMNS} FROM books b JOIN users u ON u.id = b.owner_id \
             WHERE b.id = $1"
        );

        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(book_id)
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(book.id = %book_id, error = %e, "Database error fetching book");
                AppError::from(e)
            })?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))?;

        Ok(row.into())
    }

    #[instrument(skip(db), fields(user.id = %owner_id, db.operation = "SELECT", db.table = "books"))]
    pub async fn list_owner_books(db: &PgPool, owner_id: Uuid) -> Result<Vec<Book>, AppError> {
        let query =
            format!("SELECT {BOOK_COLUMNS} FROM books WHERE owner_id = $1 ORDER BY created_at DESC");

        let books = sqlx::query_as::<_, Book>(&query)
            .bind(owner_id)
            .fetch_all(db)
            .await
            .map_err(|e| {
                error!(user.id = %owner_id, error = %e, "Database error fetching owner books");
                AppError::from(e)
            })?;

        Ok(books)
    }

    #[instrument(skip(db, cache, dto), fields(book.title = %dto.title, db.operation = "INSERT", db.table = "books"))]
    pub async fn create_book(
        db: &PgPool,
        cache: Option<&CacheService>,
        owner_id: Uuid,
        dto: CreateBookDto,
    ) -> Result<Book, AppError> {
        let query = format!(
            "INSERT INTO books (title, author, genre, location, contact_info, cover_image_url, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {BOOK_COLUMNS}"
        );

        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&dto.title)
            .bind(&dto.author)
            .bind(&dto.genre)
            .bind(&dto.location)
            .bind(&dto.contact_info)
            .bind(&dto.cover_image_url)
            .bind(owner_id)
            .fetch_one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error creating book");
                AppError::from(e)
            })?;

        track_book_mutation("create");
        invalidate::books(cache).await;

        info!(book.id = %book.id, user.id = %owner_id, "Book created");

        Ok(book)
    }

    /// Loads a book and checks that `user_id` owns it.
    async fn find_owned(db: &PgPool, user_id: Uuid, book_id: Uuid) -> Result<Book, AppError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");

        let book = sqlx::query_as::<_, Book>(&query)
            .bind(book_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))?;

        if book.owner_id != user_id {
            return Err(AppError::forbidden("Not authorized to modify this book"));
        }

        Ok(book)
    }

    #[instrument(skip(db, cache, dto), fields(book.id = %book_id, db.operation = "UPDATE", db.table = "books"))]
    pub async fn update_book(
        db: &PgPool,
        cache: Option<&CacheService>,
        user_id: Uuid,
        book_id: Uuid,
        dto: UpdateBookDto,
    ) -> Result<Book, AppError> {
        let existing = Self::find_owned(db, user_id, book_id).await?;

        if dto.is_empty() {
            debug!("Empty update, returning current book");
            return Ok(existing);
        }

        let query = format!(
            "UPDATE books SET \
                title = COALESCE($2, title), \
                author = COALESCE($3, author), \
                genre = COALESCE($4, genre), \
                location = COALESCE($5, location), \
                contact_info = COALESCE($6, contact_info), \
                cover_image_url = COALESCE($7, cover_image_url), \
                is_available = COALESCE($8, is_available), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        );

        let book = sqlx::query_as::<_, Book>(&query)
            .bind(book_id)
            .bind(&dto.title)
            .bind(&dto.author)
            .bind(&dto.genre)
            .bind(&dto.location)
            .bind(&dto.contact_info)
            .bind(&dto.cover_image_url)
            .bind(dto.is_available)
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(book.id = %book_id, error = %e, "Database error updating book");
                AppError::from(e)
            })?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))?;

        track_book_mutation("update");
        invalidate::books(cache).await;

        info!(book.id = %book.id, "Book updated");

        Ok(book)
    }

    #[instrument(skip(db, cache), fields(book.id = %book_id, db.operation = "DELETE", db.table = "books"))]
    pub async fn delete_book(
        db: &PgPool,
        cache: Option<&CacheService>,
        user_id: Uuid,
        book_id: Uuid,
    ) -> Result<(), AppError> {
        Self::find_owned(db, user_id, book_id).await?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(db)
            .await
            .map_err(|e| {
                error!(book.id = %book_id, error = %e, "Database error deleting book");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Book not found")));
        }

        track_book_mutation("delete");
        invalidate::books(cache).await;

        info!(book.id = %book_id, "Book deleted");

        Ok(())
    }
}
