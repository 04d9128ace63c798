//! YouTube API client error types.

/// Errors from YouTube Data API calls.
#[derive(Debug, thiserror::Error)]
pub enum YoutubeApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API returned a non-2xx status (bad key, quota exhausted, ...).
    #[error("YouTube API {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The API answered with an id we refuse to use as a cache key.
    #[error("YouTube API {endpoint} returned an unusable id: {source}")]
    InvalidId {
        endpoint: String,
        source: podsb_core::ValidationError,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
