//! YouTube Data API client configuration.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for the YouTube Data API client.
///
/// Custom `Debug` implementation redacts the `api_key` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct YoutubeApiConfig {
    /// Base URL of the Data API, e.g. `https://www.googleapis.com/youtube/v3`.
    pub base_url: Url,
    /// API key sent as the `key` query parameter.
    pub api_key: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for YoutubeApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl YoutubeApiConfig {
    /// Build a configuration with the default 30 second timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }
        Ok(Self {
            base_url,
            api_key: Zeroizing::new(api_key),
            timeout_secs: 30,
        })
    }

    /// Build from the service configuration.
    pub fn from_service(config: &podsb_core::ServiceConfig) -> Result<Self, ConfigError> {
        Self::new(&config.youtube_api_url, config.youtube_api_key.as_str())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("YouTube API key is required")]
    MissingKey,
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
}
