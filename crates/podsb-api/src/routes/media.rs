//! # Media Routes
//!
//! | Method | Path                  | Operation                          |
//! |--------|-----------------------|------------------------------------|
//! | GET    | `/media/:id`          | Cached audio for a video id        |
//! | GET    | `/media/youtube/:id`  | Same, under the source-qualified path |
//!
//! `:id` may carry a trailing `.m4a` (some podcast apps require an extension).
//! The file itself is streamed by `tower_http::services::ServeFile`, which
//! handles `Range`, `If-Modified-Since` and friends.

use std::convert::Infallible;
use std::path::Path;

use axum::body::Body;
use axum::extract::{Path as UrlPath, Request, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::AppError;
use crate::state::AppState;

/// Content type of served artifacts.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mp4";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/media/:id", get(get_media))
        .route("/media/youtube/:id", get(get_media))
}

async fn get_media(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
    request: Request,
) -> Result<Response, AppError> {
    let artifact = state.acquisition.acquire(&id).await?;
    Ok(serve_artifact(&artifact.path, request).await)
}

/// Stream the file at `path` as `audio/mp4`, honoring range and
/// conditional headers on `request`.
pub async fn serve_artifact(path: &Path, request: Request) -> Response {
    let result: Result<_, Infallible> = ServeFile::new(path).oneshot(request).await;
    let mut response = match result {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };
    if response.status().is_success() {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(AUDIO_CONTENT_TYPE),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    fn request(range: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/media/abc123XYZ");
        if let Some(range) = range {
            builder = builder.header(header::RANGE, range);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn serves_whole_file_as_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc123XYZ.m4a");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let response = serve_artifact(&path, request(None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], AUDIO_CONTENT_TYPE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"0123456789");
    }

    #[tokio::test]
    async fn honors_byte_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc123XYZ.m4a");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let response = serve_artifact(&path, request(Some("bytes=2-5"))).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], AUDIO_CONTENT_TYPE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"2345");
    }
}
