//! `GET /metrics`: request counters and cache counters as JSON.

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use podsb_cache::CacheStatsSnapshot;
use serde::Serialize;

use crate::middleware::metrics::{ApiMetrics, RequestStatsSnapshot};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub requests: RequestStatsSnapshot,
    pub cache: CacheStatsSnapshot,
    /// Keys with a fetch in flight or queued.
    pub active_locks: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(get_metrics))
}

async fn get_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        requests: metrics.snapshot(),
        cache: state.cache().stats().snapshot(),
        active_locks: state.cache().locks().len(),
    })
}
