//! # API Error Types
//!
//! Maps acquisition outcomes to HTTP responses with a JSON body:
//!
//! | Outcome                       | Status | Code            |
//! |-------------------------------|--------|-----------------|
//! | malformed id                  | 400    | `INVALID_ID`    |
//! | id unknown or lookup failed   | 400    | `NOT_FOUND`     |
//! | missing or wrong credentials  | 401    | `UNAUTHORIZED`  |
//! | fetch tool failed             | 500    | `FETCH_FAILED`  |
//!
//! 500 bodies never carry tool output or paths; those go to the log. 401
//! responses carry the `WWW-Authenticate` Basic challenge.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use podsb_cache::AcquireError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AUTH_REALM;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "INVALID_ID").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// The id failed the syntactic check (400).
    #[error("invalid asset id: {0}")]
    InvalidId(String),

    /// The metadata service could not resolve the id (400).
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Missing or wrong credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The fetch pipeline failed (500). Logged, not returned.
    #[error("fetch failed: {0}")]
    FetchFailed(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidId(_) => (StatusCode::BAD_REQUEST, "INVALID_ID"),
            Self::NotFound(_) => (StatusCode::BAD_REQUEST, "NOT_FOUND"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::FetchFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "FETCH_FAILED"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidId(_) => "Invalid video ID".to_string(),
            Self::NotFound(_) => "Video ID does not exist".to_string(),
            Self::Unauthorized(reason) => reason.clone(),
            Self::FetchFailed(_) => "Failed to download audio".to_string(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidId(reason) => Some(serde_json::json!({ "reason": reason })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.client_message(),
                details: self.details(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            let challenge = format!("Basic realm=\"{AUTH_REALM}\"");
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

impl From<AcquireError> for AppError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Validation(e) => Self::InvalidId(e.to_string()),
            AcquireError::NotFound(e) => Self::NotFound(e.to_string()),
            AcquireError::Fetch(e) => Self::FetchFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use podsb_cache::{FetchError, NotFoundError};
    use podsb_core::{RawAssetId, ValidationError};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::InvalidId("x".into()), StatusCode::BAD_REQUEST, "INVALID_ID"),
            (AppError::NotFound("x".into()), StatusCode::BAD_REQUEST, "NOT_FOUND"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::FetchFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "FETCH_FAILED"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[tokio::test]
    async fn validation_error_carries_reason() {
        let err: AppError = AcquireError::Validation(ValidationError::InvalidCharacter {
            ch: '/',
            position: 3,
        })
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid video ID");
        assert!(body["error"]["details"]["reason"]
            .as_str()
            .unwrap()
            .contains("'/'"));
    }

    #[tokio::test]
    async fn not_found_hides_lookup_failure() {
        let raw = RawAssetId::parse("dQw4w9WgXcQ").unwrap();
        let err: AppError =
            AcquireError::NotFound(NotFoundError::lookup_failed(&raw, "quotaExceeded")).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Video ID does not exist");
        assert!(!body.to_string().contains("quotaExceeded"));
    }

    #[tokio::test]
    async fn fetch_failure_hides_tool_output() {
        let err: AppError = AcquireError::Fetch(FetchError::ToolFailed {
            status: "exit status: 1".into(),
            stderr: "ERROR: /data/audio/.staging-abc secret path".into(),
        })
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "FETCH_FAILED");
        assert_eq!(body["error"]["message"], "Failed to download audio");
        assert!(body["error"].get("details").is_none());
        assert!(!body.to_string().contains("staging"));
    }

    #[tokio::test]
    async fn unauthorized_carries_basic_challenge() {
        let response = AppError::Unauthorized("missing credentials".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"podcastsponsorblock\""
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(body["error"]["message"], "missing credentials");
    }

    #[test]
    fn only_unauthorized_challenges() {
        let response = AppError::NotFound("x".into()).into_response();
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
