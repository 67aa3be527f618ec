use axum::{Router, middleware, routing::get};

use bookswap_cache::{CacheService, ReadThroughCache, read_through};

use crate::state::AppState;

use super::controller::{create_book, delete_book, get_book, list_books, search_books, update_book};

/// Book routes. With a cache, every route goes through the read-through
/// layer, which only acts on GET requests.
pub fn init_books_router(cache: Option<CacheService>) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search", get(search_books))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book));

    match cache {
        Some(cache) => router.route_layer(middleware::from_fn_with_state(
            ReadThroughCache::new(cache),
            read_through,
        )),
        None => router,
    }
}
