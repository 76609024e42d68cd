use crate::config::ClientConfig;
use crate::wire::ExploreRequest;
use crate::wire::encode_token;
use crate::wire::parse_explore_body;
use async_trait::async_trait;
use mettakg_explorer::ExploreClient;
use mettakg_explorer::ExploreEntry;
use mettakg_explorer::ExploreError;
use mettakg_explorer::NavToken;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use tracing::debug;
use tracing::warn;

/// [`ExploreClient`] backed by the MeTTa-KG HTTP API.
#[derive(Clone, Debug)]
pub struct HttpExploreClient {
    http: reqwest::Client,
    base_url: String,
    credential: Option<String>,
}

impl HttpExploreClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ExploreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ExploreError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential: config.credential().map(str::to_string),
        })
    }

    fn explore_url(&self, scope: &str) -> String {
        let scope = scope.trim_start_matches('/');
        format!("{}/explore/spaces/{scope}", self.base_url)
    }
}

#[async_trait]
impl ExploreClient for HttpExploreClient {
    async fn explore(
        &self,
        scope: &str,
        pattern: &str,
        token: &NavToken,
    ) -> Result<Vec<ExploreEntry>, ExploreError> {
        let Some(credential) = self.credential.as_deref() else {
            debug!("no credential configured, not calling explore for {scope}");
            return Err(ExploreError::MissingCredential);
        };

        let url = self.explore_url(scope);
        let request = ExploreRequest {
            pattern,
            token: encode_token(token),
        };
        let resp = self
            .http
            .post(&url)
            .header(AUTHORIZATION, credential)
            .json(&request)
            .send()
            .await
            .map_err(|err| ExploreError::Transport(err.to_string()))?;

        let status = resp.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!("explore {url} rejected the credential: {status}");
            return Err(ExploreError::MissingCredential);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExploreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|err| ExploreError::Transport(err.to_string()))?;
        let entries = parse_explore_body(&body)?;
        debug!("explore {url} returned {} entries", entries.len());
        Ok(entries)
    }
}
