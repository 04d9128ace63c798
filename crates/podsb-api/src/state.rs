//! # Application State
//!
//! Shared state for the Axum application, passed to handlers via the `State`
//! extractor. Everything here is built once in `main` from the
//! [`ServiceConfig`]; handlers never read the environment.

use podsb_cache::{AcquisitionService, CacheStore, MediaCache};
use podsb_core::ServiceConfig;
use zeroize::Zeroizing;

/// HTTP-layer configuration.
///
/// Custom `Debug` redacts the auth key to prevent credential leakage in logs.
#[derive(Clone, Default)]
pub struct AppConfig {
    /// Shared secret for media and metrics routes. `None` disables auth.
    pub auth_key: Option<Zeroizing<String>>,
    /// Accept the key as a `key` query parameter.
    pub allow_query_param_auth: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("auth_key", &self.auth_key.as_ref().map(|_| "[REDACTED]"))
            .field("allow_query_param_auth", &self.allow_query_param_auth)
            .finish()
    }
}

impl AppConfig {
    pub fn from_service(config: &ServiceConfig) -> Self {
        Self {
            auth_key: config.auth_key.clone(),
            allow_query_param_auth: config.allow_query_param_auth,
        }
    }
}

/// Application state shared by all handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub acquisition: AcquisitionService,
}

impl AppState {
    pub fn new(config: AppConfig, acquisition: AcquisitionService) -> Self {
        Self {
            config,
            acquisition,
        }
    }

    pub fn cache(&self) -> &MediaCache {
        self.acquisition.cache()
    }

    pub fn store(&self) -> &CacheStore {
        self.cache().store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_auth_key() {
        let config = AppConfig {
            auth_key: Some(Zeroizing::new("hunter2".to_string())),
            allow_query_param_auth: true,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
