//! # Fetch Pipeline
//!
//! Runs the external fetch+transform tool that downloads a remote asset,
//! strips the configured segment categories, and leaves the finished
//! artifact at its final path.
//!
//! ## Finalize Contract
//!
//! The final path is written by `rename` only, after the tool has exited
//! successfully and the staged file exists. A failed or interrupted run
//! leaves nothing at the final path; its staging directory is removed when
//! the run returns, or by [`crate::CacheStore::sweep_staging`] after a crash.
//!
//! No retries and no timeout: failure signaling comes from the tool alone.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use podsb_core::{BoxFuture, CanonicalAssetId, ServiceConfig};
use tokio::process::Command;

use crate::store::StagingDir;

/// Default `-f` selector.
pub const DEFAULT_FORMAT: &str = "bestaudio[ext=m4a]";

/// Default prefix the canonical id is appended to.
pub const DEFAULT_WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Bytes of tool stderr kept in [`FetchError::ToolFailed`].
const STDERR_TAIL_BYTES: usize = 2048;

/// Why a fetch did not produce an artifact.
///
/// Details are carried as strings so one failure can be cloned to every
/// request that waited on the same run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("failed to start fetch tool {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("fetch tool exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("fetch tool reported success but no artifact exists at {path}")]
    MissingArtifact { path: String },

    #[error("failed to finalize artifact at {path}: {reason}")]
    Finalize { path: String, reason: String },

    #[error("fetch task aborted: {reason}")]
    Aborted { reason: String },

    #[error("failed to prepare staging area: {reason}")]
    Staging { reason: String },
}

/// The external fetch+transform step.
///
/// On `Ok(())` the artifact must be complete at `output`. On `Err` nothing
/// may be visible at `output`.
pub trait FetchPipeline: Send + Sync {
    fn run<'a>(
        &'a self,
        id: &'a CanonicalAssetId,
        output: &'a Path,
        categories: &'a [String],
    ) -> BoxFuture<'a, Result<(), FetchError>>;
}

/// How to invoke the fetch tool.
#[derive(Debug, Clone)]
pub struct FetchToolConfig {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments placed before the generated ones.
    pub leading_args: Vec<String>,
    /// Format selector passed to `-f`.
    pub format: String,
    /// URL prefix the canonical id is appended to.
    pub watch_url_base: String,
}

impl FetchToolConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            format: DEFAULT_FORMAT.to_string(),
            watch_url_base: DEFAULT_WATCH_URL_BASE.to_string(),
        }
    }

    pub fn from_service(config: &ServiceConfig) -> Self {
        Self::new(config.ytdlp_path.clone())
    }
}

/// [`FetchPipeline`] backed by `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpPipeline {
    config: FetchToolConfig,
}

impl YtDlpPipeline {
    pub fn new(config: FetchToolConfig) -> Self {
        Self { config }
    }

    /// Generated arguments for one run, excluding `leading_args`.
    pub fn arguments(
        &self,
        id: &CanonicalAssetId,
        staged: &Path,
        categories: &[String],
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-playlist".into(),
            "--no-progress".into(),
            "-f".into(),
            self.config.format.clone().into(),
        ];
        if !categories.is_empty() {
            args.push("--sponsorblock-remove".into());
            args.push(categories.join(",").into());
        }
        args.push("-o".into());
        args.push(output_template(staged));
        args.push("--".into());
        args.push(format!("{}{}", self.config.watch_url_base, id).into());
        args
    }

    async fn fetch(
        &self,
        id: &CanonicalAssetId,
        output: &Path,
        categories: &[String],
    ) -> Result<(), FetchError> {
        let parent = output.parent().ok_or_else(|| FetchError::Staging {
            reason: format!("{} has no parent directory", output.display()),
        })?;
        let file_name = output.file_name().ok_or_else(|| FetchError::Staging {
            reason: format!("{} has no file name", output.display()),
        })?;
        let staging = StagingDir::create_in(parent)
            .await
            .map_err(|e| FetchError::Staging {
                reason: e.to_string(),
            })?;
        let staged = staging.path().join(file_name);

        let result = self.fetch_staged(id, &staged, output, categories).await;

        if let Err(e) = staging.remove().await {
            tracing::warn!(asset_id = %id, error = %e, "failed to remove staging directory");
        }
        result
    }

    /// Run the tool into `staged`, then rename it onto `output`.
    async fn fetch_staged(
        &self,
        id: &CanonicalAssetId,
        staged: &Path,
        output: &Path,
        categories: &[String],
    ) -> Result<(), FetchError> {
        let program = self.config.program.display().to_string();
        tracing::debug!(asset_id = %id, program = %program, staged = %staged.display(), "starting fetch tool");

        let result = Command::new(&self.config.program)
            .args(&self.config.leading_args)
            .args(self.arguments(id, staged, categories))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FetchError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(FetchError::ToolFailed {
                status: result.status.to_string(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        let staged_is_file = tokio::fs::metadata(staged)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !staged_is_file {
            return Err(FetchError::MissingArtifact {
                path: staged.display().to_string(),
            });
        }

        tokio::fs::rename(staged, output)
            .await
            .map_err(|e| FetchError::Finalize {
                path: output.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(asset_id = %id, path = %output.display(), "artifact finalized");
        Ok(())
    }
}

impl FetchPipeline for YtDlpPipeline {
    fn run<'a>(
        &'a self,
        id: &'a CanonicalAssetId,
        output: &'a Path,
        categories: &'a [String],
    ) -> BoxFuture<'a, Result<(), FetchError>> {
        Box::pin(self.fetch(id, output, categories))
    }
}

/// `-o` value for `staged`. `%` starts a template field, so it is doubled.
fn output_template(staged: &Path) -> OsString {
    staged.to_string_lossy().replace('%', "%%").into()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
