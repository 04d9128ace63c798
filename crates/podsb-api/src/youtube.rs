//! [`ExistenceChecker`] backed by the YouTube Data API.
//!
//! Zero matches and any lookup error both become [`NotFoundError`]; the
//! reason is kept for the log line, not for the client.

use podsb_cache::{ExistenceChecker, NotFoundError};
use podsb_core::{BoxFuture, CanonicalAssetId, RawAssetId};
use podsb_youtube::YoutubeClient;

#[derive(Debug, Clone)]
pub struct YoutubeExistenceChecker {
    client: YoutubeClient,
}

impl YoutubeExistenceChecker {
    pub fn new(client: YoutubeClient) -> Self {
        Self { client }
    }

    async fn lookup(&self, id: &RawAssetId) -> Result<CanonicalAssetId, NotFoundError> {
        match self.client.videos().lookup(id).await {
            Ok(Some(canonical)) => Ok(canonical),
            Ok(None) => Err(NotFoundError::no_match(id)),
            Err(e) => {
                tracing::error!(raw_id = %id, error = %e, "video lookup failed");
                Err(NotFoundError::lookup_failed(id, e))
            }
        }
    }
}

impl ExistenceChecker for YoutubeExistenceChecker {
    fn resolve<'a>(
        &'a self,
        id: &'a RawAssetId,
    ) -> BoxFuture<'a, Result<CanonicalAssetId, NotFoundError>> {
        Box::pin(self.lookup(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podsb_cache::NotFoundReason;
    use podsb_youtube::YoutubeApiConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn checker(server: &MockServer) -> YoutubeExistenceChecker {
        let config = YoutubeApiConfig::new(&server.uri(), "test-key").unwrap();
        YoutubeExistenceChecker::new(YoutubeClient::new(config).unwrap())
    }

    fn raw(id: &str) -> RawAssetId {
        RawAssetId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn found_video_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "items": [{ "id": "dQw4w9WgXcQ" }] })),
            )
            .mount(&server)
            .await;

        let id = checker(&server).await.resolve(&raw("dQw4w9WgXcQ")).await.unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn empty_result_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })))
            .mount(&server)
            .await;

        let err = checker(&server).await.resolve(&raw("missing1")).await.unwrap_err();
        assert_eq!(err.reason, NotFoundReason::NoMatch);
    }

    #[tokio::test]
    async fn api_error_collapses_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let err = checker(&server).await.resolve(&raw("dQw4w9WgXcQ")).await.unwrap_err();
        assert!(matches!(err.reason, NotFoundReason::LookupFailed(_)));
    }
}
