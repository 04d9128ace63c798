//! # podsb-youtube -- Typed Rust client for the YouTube Data API
//!
//! podsb needs exactly one thing from YouTube's metadata service: "does this
//! video exist, and what is its canonical id?" That question is answered by
//! `videos.list?part=id`, wrapped here as [`videos::VideosClient::lookup`].
//!
//! ## Architecture
//!
//! This crate is the only place that talks to the Data API. It reports
//! absence (`Ok(None)`) and failure (`Err`) separately; collapsing the two
//! into "unresolvable" is the caller's decision.

pub mod config;
pub mod error;
pub mod videos;

pub use config::YoutubeApiConfig;
pub use error::YoutubeApiError;

use std::time::Duration;

/// Top-level YouTube Data API client. Holds sub-clients per resource.
#[derive(Debug, Clone)]
pub struct YoutubeClient {
    videos: videos::VideosClient,
}

impl YoutubeClient {
    /// Create a new client from configuration.
    pub fn new(config: YoutubeApiConfig) -> Result<Self, YoutubeApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| YoutubeApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            videos: videos::VideosClient::new(http, config.base_url, config.api_key),
        })
    }

    /// Access the videos resource client.
    pub fn videos(&self) -> &videos::VideosClient {
        &self.videos
    }
}
