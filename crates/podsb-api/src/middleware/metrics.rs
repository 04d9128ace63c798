//! # Request Metrics
//!
//! In-process request counters, reported by `GET /metrics` next to the cache
//! counters. Client and server errors are counted apart: a spike of 400s is
//! usually a bad feed URL or an unknown video, while 500s mean the fetch
//! tool is failing. Rejected credentials get their own counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    media_requests: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    unauthorized: AtomicU64,
}

/// Shared request counters. Cloning shares the same counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    counters: Arc<Counters>,
}

/// Point-in-time copy of [`ApiMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestStatsSnapshot {
    pub requests: u64,
    /// Requests under `/media/`.
    pub media_requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    /// 401 responses; also counted in `client_errors`.
    pub unauthorized: u64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RequestStatsSnapshot {
        let c = &self.counters;
        RequestStatsSnapshot {
            requests: c.requests.load(Ordering::Relaxed),
            media_requests: c.media_requests.load(Ordering::Relaxed),
            client_errors: c.client_errors.load(Ordering::Relaxed),
            server_errors: c.server_errors.load(Ordering::Relaxed),
            unauthorized: c.unauthorized.load(Ordering::Relaxed),
        }
    }

    fn record(&self, is_media: bool, status: StatusCode) {
        let c = &self.counters;
        c.requests.fetch_add(1, Ordering::Relaxed);
        if is_media {
            c.media_requests.fetch_add(1, Ordering::Relaxed);
        }
        if status.is_client_error() {
            c.client_errors.fetch_add(1, Ordering::Relaxed);
        } else if status.is_server_error() {
            c.server_errors.fetch_add(1, Ordering::Relaxed);
        }
        if status == StatusCode::UNAUTHORIZED {
            c.unauthorized.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Count the request once its response is known.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let is_media = request.uri().path().starts_with("/media/");

    let response = next.run(request).await;

    if let Some(metrics) = metrics {
        metrics.record(is_media, response.status());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn splits_client_and_server_errors() {
        let metrics = ApiMetrics::new();
        let app = Router::new()
            .route("/media/:id", get(|| async { "audio" }))
            .route("/bad", get(|| async { StatusCode::BAD_REQUEST }))
            .route("/denied", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(from_fn(metrics_middleware))
            .layer(axum::Extension(metrics.clone()));

        for uri in ["/media/abc123XYZ", "/bad", "/denied", "/broken", "/media/abc123XYZ"] {
            let request = axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            app.clone().oneshot(request).await.unwrap();
        }

        assert_eq!(
            metrics.snapshot(),
            RequestStatsSnapshot {
                requests: 5,
                media_requests: 2,
                client_errors: 2,
                server_errors: 1,
                unauthorized: 1,
            }
        );
    }

    #[test]
    fn clones_share_counters() {
        let metrics = ApiMetrics::new();
        metrics.clone().record(false, StatusCode::OK);
        assert_eq!(metrics.snapshot().requests, 1);
    }
}
