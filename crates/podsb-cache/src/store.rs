//! # Cache Store
//!
//! Maps a [`CanonicalAssetId`] to `{data_root}/audio/{id}.m4a`. The
//! filesystem namespace is the index: a regular file at that path is a cache
//! hit, with no checksum, size check, or expiry.
//!
//! Writers never create the final path directly. They write into a
//! [`StagingDir`] created next to the artifacts (same directory, so the final
//! `rename` stays on one filesystem) and rename once the file is complete.

use std::io;
use std::path::{Path, PathBuf};

use podsb_core::{CanonicalAssetId, ServiceConfig};
use tempfile::TempDir;

/// Name prefix of staging directories inside the audio directory.
pub const STAGING_PREFIX: &str = ".staging-";

/// Errors from cache store filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Deterministic, read-mostly view of the artifact directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    audio_dir: PathBuf,
}

impl CacheStore {
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        Self {
            audio_dir: data_root.as_ref().join("audio"),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.data_path)
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Final artifact path for `id`. Pure; touches no disk.
    pub fn artifact_path(&self, id: &CanonicalAssetId) -> PathBuf {
        self.audio_dir.join(id.artifact_file_name())
    }

    /// Cache-hit test: a regular file exists at the artifact path.
    pub async fn exists(&self, id: &CanonicalAssetId) -> bool {
        tokio::fs::metadata(self.artifact_path(id))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Create the audio directory (and the data root) if missing.
    pub async fn ensure_layout(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(|e| StoreError::io(&self.audio_dir, e))
    }

    /// Whether the audio directory exists. Used by the readiness probe.
    pub async fn is_ready(&self) -> bool {
        tokio::fs::metadata(&self.audio_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Remove staging directories left behind by a previous process.
    ///
    /// Returns the number of directories removed. Finished artifacts are
    /// never touched. A missing audio directory is not an error.
    pub async fn sweep_staging(&self) -> Result<usize, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.audio_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::io(&self.audio_dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.audio_dir, e))?
        {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(STAGING_PREFIX) {
                continue;
            }
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "removed stale staging directory");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove staging directory");
                }
            }
        }
        Ok(removed)
    }
}

/// Uniquely named scratch directory for one write.
///
/// Creation and removal run on the blocking pool. Call
/// [`StagingDir::remove`] when done; dropping it unremoved still deletes the
/// directory, synchronously.
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    /// Create a `.staging-*` directory inside `parent`.
    pub async fn create_in(parent: &Path) -> Result<Self, StoreError> {
        let owned = parent.to_path_buf();
        let created = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .tempdir_in(owned)
        })
        .await
        .map_err(|e| StoreError::io(parent, io::Error::other(e)))?
        .map_err(|e| StoreError::io(parent, e))?;
        Ok(Self { dir: created })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the directory and everything left in it.
    pub async fn remove(self) -> Result<(), StoreError> {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(|e| StoreError::io(&path, io::Error::other(e)))?
            .map_err(|e| StoreError::io(&path, e))
    }
}
