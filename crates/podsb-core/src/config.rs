//! Service configuration.
//!
//! Loaded once in `main` and passed by reference to every component. The
//! loader takes a lookup closure instead of reading `std::env` directly so
//! tests can feed it a map.

use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

/// Default segment categories stripped from fetched audio.
pub const DEFAULT_CATEGORIES: &str = "sponsor";

/// Default metadata API base URL.
pub const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Default fetch tool program.
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

/// Immutable, process-wide service configuration.
///
/// Custom `Debug` redacts the API key and auth key.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Absolute data root. Artifacts live under `{data_path}/audio`.
    pub data_path: PathBuf,
    /// Credential for the metadata lookup.
    pub youtube_api_key: Zeroizing<String>,
    /// Base URL of the metadata API.
    pub youtube_api_url: String,
    /// Shared secret for HTTP access. `None` disables authentication.
    pub auth_key: Option<Zeroizing<String>>,
    /// Accept the auth key as a `key` query parameter.
    pub allow_query_param_auth: bool,
    /// Segment categories to strip, in order, without duplicates.
    pub categories_to_remove: Vec<String>,
    /// Program invoked by the fetch pipeline.
    pub ytdlp_path: PathBuf,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("data_path", &self.data_path)
            .field("youtube_api_key", &"[REDACTED]")
            .field("youtube_api_url", &self.youtube_api_url)
            .field("auth_key", &self.auth_key.as_ref().map(|_| "[REDACTED]"))
            .field("allow_query_param_auth", &self.allow_query_param_auth)
            .field("categories_to_remove", &self.categories_to_remove)
            .field("ytdlp_path", &self.ytdlp_path)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// Variables:
    /// - `PODCAST_DATA_PATH` (required)
    /// - `PODCAST_YOUTUBE_API_KEY` (required)
    /// - `PODCAST_AUTH_KEY` (optional; unset disables auth)
    /// - `PODCAST_ALLOW_QUERY_PARAM_AUTH` (default: false)
    /// - `PODCAST_CATEGORIES_TO_REMOVE` (default: `sponsor`)
    /// - `PODCAST_YTDLP_PATH` (default: `yt-dlp`)
    /// - `PODCAST_YOUTUBE_API_URL` (default: `https://www.googleapis.com/youtube/v3`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::WorkingDirectory(e.to_string()))?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Load configuration through `lookup`, resolving a relative data path
    /// against `base_dir`.
    pub fn from_lookup<F>(lookup: F, base_dir: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_path = lookup("PODCAST_DATA_PATH")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("PODCAST_DATA_PATH"))?;
        let data_path = PathBuf::from(data_path.trim());
        let data_path = if data_path.is_absolute() {
            data_path
        } else {
            base_dir.join(data_path)
        };

        let youtube_api_key = lookup("PODCAST_YOUTUBE_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("PODCAST_YOUTUBE_API_KEY"))?;

        Ok(Self {
            data_path,
            youtube_api_key: Zeroizing::new(youtube_api_key),
            youtube_api_url: lookup("PODCAST_YOUTUBE_API_URL")
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_URL.to_string()),
            auth_key: lookup("PODCAST_AUTH_KEY")
                .filter(|v| !v.is_empty())
                .map(Zeroizing::new),
            allow_query_param_auth: is_true(lookup("PODCAST_ALLOW_QUERY_PARAM_AUTH").as_deref()),
            categories_to_remove: parse_categories(
                &lookup("PODCAST_CATEGORIES_TO_REMOVE")
                    .unwrap_or_else(|| DEFAULT_CATEGORIES.to_string()),
            ),
            ytdlp_path: lookup("PODCAST_YTDLP_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP_PATH)),
        })
    }
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Split a comma separated list into an ordered set: trimmed, empties
/// dropped, first occurrence wins.
pub fn parse_categories(raw: &str) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !categories.iter().any(|c| c == part) {
            categories.push(part.to_string());
        }
    }
    categories
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    #[error("cannot determine working directory: {0}")]
    WorkingDirectory(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned(), Path::new("/srv"))
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = load(&[
            ("PODCAST_DATA_PATH", "/data"),
            ("PODCAST_YOUTUBE_API_KEY", "yt-key"),
        ])
        .unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("/data"));
        assert_eq!(cfg.youtube_api_key.as_str(), "yt-key");
        assert_eq!(cfg.youtube_api_url, DEFAULT_YOUTUBE_API_URL);
        assert!(cfg.auth_key.is_none());
        assert!(!cfg.allow_query_param_auth);
        assert_eq!(cfg.categories_to_remove, vec!["sponsor".to_string()]);
        assert_eq!(cfg.ytdlp_path, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn relative_data_path_is_resolved() {
        let cfg = load(&[
            ("PODCAST_DATA_PATH", "data"),
            ("PODCAST_YOUTUBE_API_KEY", "k"),
        ])
        .unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("/srv/data"));
    }

    #[test]
    fn missing_required_values_are_reported() {
        let err = load(&[("PODCAST_YOUTUBE_API_KEY", "k")]).unwrap_err();
        assert!(err.to_string().contains("PODCAST_DATA_PATH"));

        let err = load(&[("PODCAST_DATA_PATH", "/data")]).unwrap_err();
        assert!(err.to_string().contains("PODCAST_YOUTUBE_API_KEY"));
    }

    #[test]
    fn auth_settings_are_read() {
        let cfg = load(&[
            ("PODCAST_DATA_PATH", "/data"),
            ("PODCAST_YOUTUBE_API_KEY", "k"),
            ("PODCAST_AUTH_KEY", "hunter2"),
            ("PODCAST_ALLOW_QUERY_PARAM_AUTH", "TRUE"),
        ])
        .unwrap();
        assert_eq!(cfg.auth_key.as_deref().map(String::as_str), Some("hunter2"));
        assert!(cfg.allow_query_param_auth);
    }

    #[test]
    fn categories_are_an_ordered_set() {
        assert_eq!(
            parse_categories("sponsor, intro,,sponsor ,outro"),
            vec!["sponsor", "intro", "outro"]
        );
        assert!(parse_categories("").is_empty());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = load(&[
            ("PODCAST_DATA_PATH", "/data"),
            ("PODCAST_YOUTUBE_API_KEY", "very-secret-api-key"),
            ("PODCAST_AUTH_KEY", "very-secret-auth-key"),
        ])
        .unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
