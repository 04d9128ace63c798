//! Per-request acquisition: validate, resolve, then obtain from the cache.

use std::sync::Arc;

use podsb_core::{RawAssetId, ValidationError};

use crate::cache::{CachedArtifact, MediaCache};
use crate::fetch::FetchError;
use crate::resolve::{ExistenceChecker, NotFoundError};

/// Terminal outcome of a failed acquisition.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AcquireError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Entry point for a media request.
#[derive(Clone)]
pub struct AcquisitionService {
    checker: Arc<dyn ExistenceChecker>,
    cache: MediaCache,
}

impl std::fmt::Debug for AcquisitionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl AcquisitionService {
    pub fn new(checker: Arc<dyn ExistenceChecker>, cache: MediaCache) -> Self {
        Self { checker, cache }
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Run one request through validate → resolve → obtain.
    ///
    /// Validation failures return before any network call. Only the
    /// canonical id reaches the cache.
    pub async fn acquire(&self, raw: &str) -> Result<CachedArtifact, AcquireError> {
        let raw_id = RawAssetId::parse(raw).map_err(|e| {
            tracing::debug!(raw_id = %raw, error = %e, "rejected asset id");
            e
        })?;

        let canonical = self.checker.resolve(&raw_id).await.map_err(|e| {
            tracing::warn!(raw_id = %raw_id, reason = %e.reason, "asset id not resolvable");
            e
        })?;
        if canonical.as_str() != raw_id.as_str() {
            tracing::debug!(raw_id = %raw_id, asset_id = %canonical, "resolved to different canonical id");
        }

        let artifact = self.cache.obtain(&canonical).await?;
        tracing::info!(asset_id = %artifact.id, origin = artifact.origin.as_str(), "serving artifact");
        Ok(artifact)
    }
}
