//! Typed client for the YouTube Data API `videos` resource.
//!
//! | Method | Path                         | Operation                  |
//! |--------|------------------------------|----------------------------|
//! | GET    | `/videos?part=id&id={id}`    | Resolve a video id         |

use std::sync::Arc;

use podsb_core::{CanonicalAssetId, RawAssetId};
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::error::YoutubeApiError;

/// `videos.list` response, reduced to what the lookup needs.
///
/// Unknown fields (`kind`, `etag`, `pageInfo`, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

/// One entry of `items`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoItem {
    pub id: String,
}

/// Client for the `videos` resource.
#[derive(Clone)]
pub struct VideosClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Arc<Zeroizing<String>>,
}

impl std::fmt::Debug for VideosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideosClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl VideosClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, api_key: Zeroizing<String>) -> Self {
        Self {
            http,
            base_url,
            api_key: Arc::new(api_key),
        }
    }

    fn list_url(&self, id: &RawAssetId) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/videos",
            self.base_url.as_str().trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("part", "id")
            .append_pair("id", id.as_str())
            .append_pair("key", self.api_key.as_str());
        Ok(url)
    }

    /// Resolve `id` to the canonical id reported by YouTube.
    ///
    /// Calls `GET {base_url}/videos?part=id&id={id}&key={key}`.
    /// Returns `Ok(None)` when the response has no items. Sends exactly one
    /// request; transport failures come back as [`YoutubeApiError::Http`].
    pub async fn lookup(
        &self,
        id: &RawAssetId,
    ) -> Result<Option<CanonicalAssetId>, YoutubeApiError> {
        let endpoint = format!("GET /videos?id={id}");
        let url = self.list_url(id).map_err(|e| {
            YoutubeApiError::Config(crate::config::ConfigError::InvalidUrl(
                self.base_url.to_string(),
                e.to_string(),
            ))
        })?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| YoutubeApiError::Http {
                endpoint: endpoint.clone(),
                source: e.without_url(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(YoutubeApiError::ApiError {
                endpoint,
                status,
                body,
            });
        }

        let list: VideoListResponse =
            resp.json()
                .await
                .map_err(|e| YoutubeApiError::Deserialization {
                    endpoint: endpoint.clone(),
                    source: e.without_url(),
                })?;

        match list.items.into_iter().next() {
            Some(item) => CanonicalAssetId::new(item.id)
                .map(Some)
                .map_err(|source| YoutubeApiError::InvalidId { endpoint, source }),
            None => Ok(None),
        }
    }
}
