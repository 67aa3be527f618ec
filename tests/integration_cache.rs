//! Router-level cache behaviour. These run without Postgres or Redis: the
//! pool points at a closed port and the cache uses the in-memory store.

mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use bookswap::bookswap_models::roles;
use common::{memory_cache, send, settle, setup_test_app, token_for, unreachable_pool};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_cache_status() {
    let (store, cache) = memory_cache();
    let app = setup_test_app(unreachable_pool(), Some(cache));

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"], "connected");
    assert!(body["timestamp"].is_string());

    store.set_connected(false);
    let (_, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(body["cache"], "disconnected");

    let app = setup_test_app(unreachable_pool(), None);
    let (_, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(body["cache"], "disabled");
}

#[tokio::test]
async fn test_cached_listing_is_served_without_database() {
    let (store, cache) = memory_cache();
    let cached = json!({
        "books": [],
        "pagination": {
            "total_items": 0,
            "current_page": 1,
            "page_size": 20,
            "total_pages": 0,
            "has_more": false
        }
    });
    store.insert_raw(
        "search:page:1:url:/api/books",
        cached.to_string(),
        Duration::from_secs(60),
    );
    let app = setup_test_app(unreachable_pool(), Some(cache));

    let (status, body) = send(&app, Method::GET, "/api/books?page=1", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, cached);
}

#[tokio::test]
async fn test_cached_search_key_includes_query() {
    let (store, cache) = memory_cache();
    let cached = json!({ "books": [], "query": "dune" });
    store.insert_raw(
        "search:genre:fiction:query:dune:url:/api/books/search",
        cached.to_string(),
        Duration::from_secs(60),
    );
    let app = setup_test_app(unreachable_pool(), Some(cache));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/books/search?query=dune&genre=fiction",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, cached);
}

#[tokio::test]
async fn test_database_failure_is_not_cached() {
    let (store, cache) = memory_cache();
    let app = setup_test_app(unreachable_pool(), Some(cache));

    let (status, body) = send(&app, Method::GET, "/api/books", None, None).await;
    settle().await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert_eq!(store.get_calls(), 1);
    assert_eq!(store.set_calls(), 0);
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn test_bad_book_id_is_not_cached() {
    let (store, cache) = memory_cache();
    let app = setup_test_app(unreachable_pool(), Some(cache));

    let (status, _) = send(&app, Method::GET, "/api/books/not-a-uuid", None, None).await;
    settle().await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.set_calls(), 0);
}

#[tokio::test]
async fn test_unauthenticated_mutations_are_rejected_before_cache() {
    let (store, cache) = memory_cache();
    let app = setup_test_app(unreachable_pool(), Some(cache));
    let id = Uuid::new_v4();
    let book = json!({ "title": "Dune", "author": "Frank Herbert", "location": "Pune" });

    let (status, _) = send(&app, Method::POST, "/api/books", None, Some(book.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/books/{id}"),
        None,
        Some(book),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/books/{id}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(store.get_calls(), 0);
    assert_eq!(store.set_calls(), 0);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let (_, cache) = memory_cache();
    let app = setup_test_app(unreachable_pool(), Some(cache));
    let book = json!({ "title": "Dune", "author": "Frank Herbert", "location": "Pune" });

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some("not.a.token"),
        Some(book),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_seeker_cannot_create_books() {
    let (store, cache) = memory_cache();
    let app = setup_test_app(unreachable_pool(), Some(cache));
    let token = token_for(Uuid::new_v4(), roles::SEEKER);
    let book = json!({ "title": "Dune", "author": "Frank Herbert", "location": "Pune" });

    let (status, _) = send(&app, Method::POST, "/api/books", Some(&token), Some(book)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(store.get_calls(), 0);
}

#[tokio::test]
async fn test_invalid_book_body_is_unprocessable() {
    let app = setup_test_app(unreachable_pool(), None);
    let token = token_for(Uuid::new_v4(), roles::OWNER);
    let book = json!({ "title": "", "author": "Frank Herbert", "location": "Pune" });

    let (status, body) = send(&app, Method::POST, "/api/books", Some(&token), Some(book)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "title is required");
}

#[tokio::test]
async fn test_disconnected_cache_falls_through_to_handler() {
    let (store, cache) = memory_cache();
    store.insert_raw(
        "search:url:/api/books",
        json!({ "stale": true }).to_string(),
        Duration::from_secs(60),
    );
    store.set_connected(false);
    let app = setup_test_app(unreachable_pool(), Some(cache));

    let (status, _) = send(&app, Method::GET, "/api/books", None, None).await;

    // Handler ran and hit the unreachable database
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.get_calls(), 0);
}
