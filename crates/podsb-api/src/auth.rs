//! # Authentication Middleware
//!
//! A single shared key guards the media and metrics routes. A request is
//! accepted when either:
//!
//! - query-parameter auth is enabled and `?key=` equals the key, or
//! - it carries HTTP Basic credentials whose password equals the key (the
//!   user name is ignored; podcast clients need something to put there).
//!
//! Rejections are 401 with `WWW-Authenticate: Basic realm="podcastsponsorblock"`
//! so podcast apps prompt for credentials. When no key is configured every
//! request passes.

use axum::extract::Request;
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::AppError;
use crate::state::AppConfig;

/// Realm advertised in the `WWW-Authenticate` challenge.
pub const AUTH_REALM: &str = "podcastsponsorblock";

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the key to prevent credential leakage in logs.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub key: Option<Zeroizing<String>>,
    pub allow_query_param: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("allow_query_param", &self.allow_query_param)
            .finish()
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            key: config.auth_key.clone(),
            allow_query_param: config.allow_query_param_auth,
        }
    }
}

/// Constant-time comparison of a provided key against the expected one.
///
/// When lengths differ, performs a dummy comparison to avoid leaking length
/// information through timing variance.
fn constant_time_key_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Password from a Basic `Authorization` header, if there is one.
fn basic_password(headers: &HeaderMap) -> Option<Zeroizing<String>> {
    headers
        .typed_get::<Authorization<Basic>>()
        .map(|auth| Zeroizing::new(auth.password().to_string()))
}

/// Value of the `key` query parameter, if present.
fn query_key(uri: &Uri) -> Option<Zeroizing<String>> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "key")
        .map(|(_, value)| Zeroizing::new(value.into_owned()))
}

/// Check the request against the configured key.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let Some(expected) = config.key.as_deref() else {
        return next.run(request).await;
    };

    if config.allow_query_param {
        if let Some(provided) = query_key(request.uri()) {
            if constant_time_key_eq(&provided, expected) {
                return next.run(request).await;
            }
        }
    }

    let password = basic_password(request.headers());
    match password {
        Some(password) if constant_time_key_eq(&password, expected) => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "authentication failed: wrong key");
            AppError::Unauthorized("invalid credentials".into()).into_response()
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "authentication failed: no credentials");
            AppError::Unauthorized("missing credentials".into()).into_response()
        }
    }
}
