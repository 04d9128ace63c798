//! # Media Cache
//!
//! Single-flight acquisition of one canonical asset:
//!
//! ```text
//! exists? ── yes ──▶ Hit
//!    │ no
//!    ▼
//! lock(id) ─▶ exists? ── yes ──▶ Hit (filled by a concurrent request)
//!                │ no
//!                ▼
//!          earlier failure in this slot? ── yes ──▶ same FetchError
//!                │ no
//!                ▼
//!          run pipeline ─▶ exists? ── yes ──▶ Fetched
//!                             │ no
//!                             ▼
//!                          FetchError
//! ```
//!
//! The locked section runs on its own task: a caller that goes away stops
//! waiting, but the fetch it started runs to completion and later requests
//! see the artifact.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use podsb_core::CanonicalAssetId;
use serde::Serialize;

use crate::fetch::{FetchError, FetchPipeline};
use crate::lock::LockRegistry;
use crate::store::CacheStore;

/// How an artifact came to be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactOrigin {
    /// Already on disk.
    Hit,
    /// Produced by a fetch run during this request.
    Fetched,
}

impl ArtifactOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Fetched => "fetched",
        }
    }
}

/// A finished artifact ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub id: CanonicalAssetId,
    pub path: PathBuf,
    pub origin: ArtifactOrigin,
}

/// Cache counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    shared_failures: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub shared_failures: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            shared_failures: self.shared_failures.load(Ordering::Relaxed),
        }
    }
}

/// Disk-backed, single-flight media cache. Cheap to clone.
#[derive(Clone)]
pub struct MediaCache {
    store: CacheStore,
    locks: LockRegistry,
    pipeline: Arc<dyn FetchPipeline>,
    categories: Arc<[String]>,
    stats: Arc<CacheStats>,
}

impl std::fmt::Debug for MediaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCache")
            .field("store", &self.store)
            .field("locks", &self.locks)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

impl MediaCache {
    pub fn new(
        store: CacheStore,
        pipeline: Arc<dyn FetchPipeline>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            store,
            locks: LockRegistry::new(),
            pipeline,
            categories: categories.into(),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Return the artifact for `id`, fetching it if absent.
    pub async fn obtain(&self, id: &CanonicalAssetId) -> Result<CachedArtifact, FetchError> {
        if self.store.exists(id).await {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(asset_id = %id, "cache hit");
            return Ok(self.artifact(id, ArtifactOrigin::Hit));
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let this = self.clone();
        let id = id.clone();
        tokio::spawn(async move { this.fill(id).await })
            .await
            .map_err(|e| FetchError::Aborted {
                reason: e.to_string(),
            })?
    }

    async fn fill(&self, id: CanonicalAssetId) -> Result<CachedArtifact, FetchError> {
        let mut lock = self.locks.acquire(&id).await;

        if self.store.exists(&id).await {
            tracing::debug!(asset_id = %id, "artifact filled by concurrent request");
            return Ok(self.artifact(&id, ArtifactOrigin::Hit));
        }

        if let Some(error) = lock.failure() {
            self.stats.shared_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(asset_id = %id, error = %error, "concurrent fetch failed");
            return Err(error.clone());
        }

        self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::info!(asset_id = %id, categories = ?self.categories, "fetching artifact");

        let path = self.store.artifact_path(&id);
        let mut result = self
            .pipeline
            .run(&id, &path, &self.categories)
            .await
            .map(|()| self.artifact(&id, ArtifactOrigin::Fetched));
        if result.is_ok() && !self.store.exists(&id).await {
            result = Err(FetchError::MissingArtifact {
                path: path.display().to_string(),
            });
        }

        match &result {
            Ok(_) => tracing::info!(asset_id = %id, "artifact fetched"),
            Err(error) => {
                self.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(asset_id = %id, error = %error, "fetch failed");
                lock.record_failure(error.clone());
            }
        }
        result
    }

    fn artifact(&self, id: &CanonicalAssetId, origin: ArtifactOrigin) -> CachedArtifact {
        CachedArtifact {
            id: id.clone(),
            path: self.store.artifact_path(id),
            origin,
        }
    }
}
