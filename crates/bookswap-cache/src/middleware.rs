//! Read-through response caching for GET routes.
//!
//! On a hit the cached JSON body is returned and the handler never runs.
//! On a miss the handler runs, and a successful JSON response is buffered,
//! written to the cache in the background, and emitted unchanged.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use bookswap_cache::{ReadThroughCache, read_through};
//!
//! let books = Router::new()
//!     .route("/books", get(list_books))
//!     .route_layer(middleware::from_fn_with_state(
//!         ReadThroughCache::new(cache),
//!         read_through,
//!     ));
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{OriginalUri, Query, Request, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::CacheService;
use crate::keys::CacheParams;

/// Middleware state: the cache handle plus the TTL for captured responses.
#[derive(Clone, Debug)]
pub struct ReadThroughCache {
    cache: CacheService,
    ttl: Duration,
}

impl ReadThroughCache {
    /// Uses the cache's default TTL.
    pub fn new(cache: CacheService) -> Self {
        let ttl = cache.default_ttl();
        Self { cache, ttl }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Key parameters for a request: its query pairs plus `url`, the path as
/// seen by the outermost router.
///
/// Repeated query names are joined with `,`. The path always wins over a
/// query parameter named `url`.
pub fn request_params(request: &Request) -> CacheParams {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let pairs = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in pairs {
        grouped.entry(name).or_default().push(value);
    }

    let mut params: CacheParams = grouped
        .into_iter()
        .map(|(name, values)| (name, values.join(",")))
        .collect();
    params.insert("url", path);

    params
}

fn is_cacheable(response: &Response) -> bool {
    response.status().is_success()
        && response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"))
}

/// Read-through cache middleware. Use with
/// [`axum::middleware::from_fn_with_state`].
pub async fn read_through(
    State(layer): State<ReadThroughCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = layer.cache.build_key(&request_params(&request));

    if let Some(body) = layer.cache.get::<Value>(&key).await {
        debug!(cache.key = %key, "Serving cached response");
        return (StatusCode::OK, Json(body)).into_response();
    }

    let response = next.run(request).await;
    if !is_cacheable(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            // The original headers describe a body that no longer exists.
            warn!(cache.key = %key, error = %e, "Failed to buffer response body");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to read response body" })),
            )
                .into_response();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => {
            let cache = layer.cache.clone();
            let ttl = layer.ttl;
            tokio::spawn(async move {
                cache.set_with_ttl(&key, &value, ttl).await;
            });
        }
        Err(e) => {
            debug!(cache.key = %key, error = %e, "Response is not valid JSON, not caching");
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheConfig, MemoryStore};
    use axum::{Router, middleware, routing::get};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn cache_with_store() -> (Arc<MemoryStore>, ReadThroughCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheService::new(store.clone(), &CacheConfig::default());
        (store, ReadThroughCache::new(cache))
    }

    /// Router whose handler returns `{"n": <call number>}` and counts calls.
    fn counting_app(layer: ReadThroughCache, calls: Arc<AtomicUsize>) -> Router {
        let handler = move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Json(json!({ "n": n }))
            }
        };

        Router::new()
            .route("/api/books", get(handler.clone()).post(handler))
            .layer(middleware::from_fn_with_state(layer, read_through))
    }

    // Lets spawned cache writes run on the current-thread runtime.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_hit_skips_handler() {
        let (store, layer) = cache_with_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(layer, calls.clone());

        let (status, first) = send(&app, Method::GET, "/api/books?page=1").await;
        assert_eq!(status, StatusCode::OK);
        settle().await;

        let (status, second) = send(&app, Method::GET, "/api/books?page=1").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(first, json!({ "n": 1 }));
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.set_calls(), 1);
    }

    #[tokio::test]
    async fn test_only_first_body_is_persisted() {
        let (store, layer) = cache_with_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(layer, calls.clone());

        send(&app, Method::GET, "/api/books").await;
        settle().await;

        assert_eq!(
            store.raw("search:url:/api/books").as_deref(),
            Some(r#"{"n":1}"#)
        );
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache() {
        let (store, layer) = cache_with_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(layer, calls.clone());

        send(&app, Method::POST, "/api/books").await;
        send(&app, Method::POST, "/api/books").await;
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.get_calls(), 0);
        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_key_uses_path_and_sorted_query() {
        let (store, layer) = cache_with_store();
        let app = counting_app(layer, Arc::new(AtomicUsize::new(0)));

        send(&app, Method::GET, "/api/books?page=2&genre=fiction&query=").await;
        settle().await;

        assert_eq!(
            store.keys(),
            vec!["search:genre:fiction:page:2:url:/api/books".to_string()]
        );
    }

    #[tokio::test]
    async fn test_path_overrides_url_query_param() {
        let (store, layer) = cache_with_store();
        let app = counting_app(layer, Arc::new(AtomicUsize::new(0)));

        send(&app, Method::GET, "/api/books?url=/elsewhere").await;
        settle().await;

        assert_eq!(store.keys(), vec!["search:url:/api/books".to_string()]);
    }

    #[tokio::test]
    async fn test_nested_router_keys_on_full_path() {
        let (store, layer) = cache_with_store();
        let inner = Router::new()
            .route("/books", get(|| async { Json(json!({ "ok": true })) }))
            .layer(middleware::from_fn_with_state(layer, read_through));
        let app = Router::new().nest("/api", inner);

        send(&app, Method::GET, "/api/books").await;
        settle().await;

        assert_eq!(store.keys(), vec!["search:url:/api/books".to_string()]);
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let (store, layer) = cache_with_store();
        let app = Router::new()
            .route(
                "/api/books/missing",
                get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "error": "Book not found" }))) }),
            )
            .layer(middleware::from_fn_with_state(layer, read_through));

        let (status, _) = send(&app, Method::GET, "/api/books/missing").await;
        settle().await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_json_responses_are_not_cached() {
        let (store, layer) = cache_with_store();
        let app = Router::new()
            .route("/api/books", get(|| async { "plain text" }))
            .layer(middleware::from_fn_with_state(layer, read_through));

        send(&app, Method::GET, "/api/books").await;
        settle().await;

        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_broken_body_returns_server_error() {
        let (store, layer) = cache_with_store();
        let app = Router::new()
            .route(
                "/api/books",
                get(|| async {
                    let chunks = futures_util::stream::iter(vec![
                        Ok(axum::body::Bytes::from_static(b"{\"n\":")),
                        Err(std::io::Error::other("connection reset")),
                    ]);
                    ([(CONTENT_TYPE, "application/json")], Body::from_stream(chunks))
                }),
            )
            .layer(middleware::from_fn_with_state(layer, read_through));

        let (status, body) = send(&app, Method::GET, "/api/books").await;
        settle().await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to read response body" }));
        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_store_still_answers() {
        let (store, layer) = cache_with_store();
        store.set_connected(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(layer, calls.clone());

        let (status, first) = send(&app, Method::GET, "/api/books").await;
        let (_, second) = send(&app, Method::GET, "/api/books").await;
        settle().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, json!({ "n": 1 }));
        assert_eq!(second, json!({ "n": 2 }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_repeated_query_names_are_joined() {
        let request = Request::builder()
            .uri("/api/books?genre=poetry&genre=fiction")
            .body(Body::empty())
            .unwrap();

        let params = request_params(&request);

        assert_eq!(
            params.get("genre"),
            Some(&crate::keys::ParamValue::Str("poetry,fiction".into()))
        );
        assert_eq!(
            params.get("url"),
            Some(&crate::keys::ParamValue::Str("/api/books".into()))
        );
    }
}
