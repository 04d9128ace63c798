//! # podsb-api -- Axum HTTP Service
//!
//! Serves YouTube audio with sponsor segments removed, as files podcast apps
//! can download. The first request for a video fetches and transforms it;
//! every later request streams the cached copy.
//!
//! ## API Surface
//!
//! | Path                   | Module               | Auth |
//! |------------------------|----------------------|------|
//! | `/media/:id`           | [`routes::media`]    | yes  |
//! | `/media/youtube/:id`   | [`routes::media`]    | yes  |
//! | `/metrics`             | [`routes::metrics`]  | yes  |
//! | `/health/liveness`     | this module          | no   |
//! | `/health/readiness`    | this module          | no   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod youtube;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::Router;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig::from(&state.config);
    let metrics = ApiMetrics::new();

    // Authenticated routes.
    let api = Router::new()
        .merge(routes::media::router())
        .merge(routes::metrics::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state.clone());

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the audio directory exists.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.store().is_ready().await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
