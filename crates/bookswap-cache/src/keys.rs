//! Cache key generation and invalidation utilities.
//!
//! Keys are derived from a mapping of named request parameters. Parameter
//! names are sorted before rendering, so two mappings holding the same
//! `(name, value)` pairs always produce the same key regardless of the order
//! they were built in:
//!
//! ```text
//! {url: "/api/books", genre: "fiction", page: "1"}
//!     -> "search:genre:fiction:page:1:url:/api/books"
//! ```
//!
//! Values are rendered through their string form, so `true` and `"true"`
//! land on the same key. Callers that need to tell them apart must encode
//! the difference in the parameter name.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::CacheService;

/// Namespace for cached search and listing responses.
pub const SEARCH_PREFIX: &str = "search";

/// A single parameter value feeding a cache key.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Absent,
}

impl ParamValue {
    /// String form used in the key, `None` for absent and empty values.
    fn render(&self) -> Option<String> {
        match self {
            ParamValue::Absent => None,
            ParamValue::Str(s) if s.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Absent => Ok(()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Str(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Absent)
    }
}

/// Named parameters for a cache key, kept sorted by name.
///
/// Inserting a name twice keeps the last value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheParams {
    entries: BTreeMap<String, ParamValue>,
}

impl CacheParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CacheParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = CacheParams::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for CacheParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// Builds a key in the [`SEARCH_PREFIX`] namespace.
pub fn build_key(params: &CacheParams) -> String {
    build_key_with_prefix(SEARCH_PREFIX, params)
}

/// Builds `"<prefix>:<name>:<value>:..."` from the non-empty parameters in
/// name order. An empty mapping yields the bare `"<prefix>:"`.
pub fn build_key_with_prefix(prefix: &str, params: &CacheParams) -> String {
    let parts: Vec<String> = params
        .entries
        .iter()
        .filter_map(|(name, value)| value.render().map(|v| format!("{name}:{v}")))
        .collect();

    format!("{}:{}", prefix, parts.join(":"))
}

/// Cache patterns for book listings.
pub mod books {
    /// Pattern covering every cached list, search and detail response.
    ///
    /// Any book mutation drops the whole namespace.
    pub fn invalidation_pattern(prefix: &str) -> String {
        format!("{prefix}:*")
    }
}

/// Cache invalidation helpers for mutating operations.
///
/// Call these only after the write has been committed.
pub mod invalidate {
    use super::*;

    /// Invalidate all cached book responses.
    pub async fn books(cache: Option<&CacheService>) {
        let Some(cache) = cache else { return };

        let pattern = books::invalidation_pattern(cache.key_prefix());
        let deleted = cache.invalidate(&pattern).await;

        if deleted == 0 && !cache.is_available() {
            warn!(cache.pattern = %pattern, "Cache unavailable, book listings may be stale until TTL expiry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_sorted_by_name() {
        let params = CacheParams::new()
            .with("url", "/api/books")
            .with("genre", "fiction")
            .with("page", "1");

        assert_eq!(
            build_key(&params),
            "search:genre:fiction:page:1:url:/api/books"
        );
    }

    #[test]
    fn test_empty_and_absent_values_are_skipped() {
        let params = CacheParams::new()
            .with("url", "/api/books")
            .with("genre", "")
            .with("page", None::<&str>);

        assert_eq!(build_key(&params), "search:url:/api/books");
    }

    #[test]
    fn test_empty_mapping_yields_bare_prefix() {
        assert_eq!(build_key(&CacheParams::new()), "search:");
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let forward: CacheParams = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let backward: CacheParams = [("c", "3"), ("b", "2"), ("a", "1")].into_iter().collect();

        assert_eq!(build_key(&forward), build_key(&backward));
    }

    #[test]
    fn test_different_values_produce_different_keys() {
        let page_one = CacheParams::new().with("url", "/api/books").with("page", 1);
        let page_two = CacheParams::new().with("url", "/api/books").with("page", 2);

        assert_ne!(build_key(&page_one), build_key(&page_two));
    }

    #[test]
    fn test_build_key_is_pure() {
        let params = CacheParams::new().with("query", "dune").with("limit", 20);
        assert_eq!(build_key(&params), build_key(&params));
    }

    #[test]
    fn test_values_render_through_string_form() {
        let params = CacheParams::new()
            .with("available", true)
            .with("limit", 20)
            .with("ratio", 0.5);

        assert_eq!(build_key(&params), "search:available:true:limit:20:ratio:0.5");
    }

    #[test]
    fn test_bool_and_string_collide() {
        let as_bool = CacheParams::new().with("is_available", true);
        let as_str = CacheParams::new().with("is_available", "true");

        assert_eq!(build_key(&as_bool), build_key(&as_str));
    }

    #[test]
    fn test_false_and_zero_are_kept() {
        let params = CacheParams::new().with("is_available", false).with("offset", 0);
        assert_eq!(build_key(&params), "search:is_available:false:offset:0");
    }

    #[test]
    fn test_last_insert_wins() {
        let mut params = CacheParams::new();
        params.insert("genre", "fiction").insert("genre", "poetry");
        assert_eq!(build_key(&params), "search:genre:poetry");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_custom_prefix() {
        let params = CacheParams::new().with("type", "books");
        assert_eq!(build_key_with_prefix("bookswap", &params), "bookswap:type:books");
    }

    #[test]
    fn test_books_invalidation_pattern_covers_namespace() {
        assert_eq!(books::invalidation_pattern(SEARCH_PREFIX), "search:*");
    }

    fn cache_with_book_entries() -> (std::sync::Arc<crate::MemoryStore>, CacheService) {
        use std::time::Duration;

        let store = std::sync::Arc::new(crate::MemoryStore::new());
        let cache = CacheService::new(store.clone(), &crate::CacheConfig::default());
        for key in [
            "search:page:1:url:/api/books",
            "search:genre:fiction:query:dune:url:/api/books/search",
            "search:url:/api/books/5b0d3c4e-2f1a-4c1e-9a57-0c7e3b1d2f10",
        ] {
            store.insert_raw(key, "{}", Duration::from_secs(60));
        }
        (store, cache)
    }

    #[tokio::test]
    async fn test_invalidate_books_clears_list_search_and_detail() {
        let (store, cache) = cache_with_book_entries();
        store.insert_raw("other:1", "{}", std::time::Duration::from_secs(60));

        invalidate::books(Some(&cache)).await;

        assert_eq!(store.keys(), vec!["other:1".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_books_without_cache_is_noop() {
        let (store, _) = cache_with_book_entries();

        invalidate::books(None).await;

        assert_eq!(store.keys().len(), 3);
    }
}
