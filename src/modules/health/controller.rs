use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use bookswap_cache::CacheService;

use crate::state::AppState;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Connected,
    Disconnected,
    Disabled,
}

impl CacheStatus {
    pub fn of(cache: Option<&CacheService>) -> Self {
        match cache {
            Some(cache) if cache.is_available() => Self::Connected,
            Some(_) => Self::Disconnected,
            None => Self::Disabled,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub cache: CacheStatus,
}

/// Liveness check. Always `ok`; the cache field reports Redis reachability.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        cache: CacheStatus::of(state.cache()),
    })
}
