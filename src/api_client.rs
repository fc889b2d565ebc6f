//! App configuration fetched from the REST API.

use crate::collaborators::AppConfigSource;
use crate::environment::{AppConfig, BuildMode};
use crate::error::SdkError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SyncResponse {
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    config: SyncConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncConfig {
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(default)]
    use_legacy_domain: bool,
}

impl SyncResponse {
    fn into_app_config(self, requested_app_id: &str) -> AppConfig {
        AppConfig {
            app_id: Some(self.app_id.unwrap_or_else(|| requested_app_id.to_string())),
            subdomain: self.config.subdomain.filter(|s| !s.is_empty()),
            use_legacy_domain: self.config.use_legacy_domain,
        }
    }
}

/// `GET {api}/sync/{app_id}/web`
pub struct HttpAppConfigSource {
    http_client: Client,
    api_base: String,
}

impl HttpAppConfigSource {
    pub fn new(build: BuildMode) -> Result<Self, SdkError> {
        Self::with_base(build.api_url())
    }

    pub fn with_base(api_base: &str) -> Result<Self, SdkError> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pushlink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn sync_url(&self, app_id: &str) -> String {
        format!("{}/sync/{}/web", self.api_base, app_id)
    }
}

#[async_trait]
impl AppConfigSource for HttpAppConfigSource {
    async fn get_app_config(&self, app_id: &str) -> Result<AppConfig, SdkError> {
        let url = self.sync_url(app_id);
        debug!("Fetching app config from {}", url);

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SdkError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }
        let body: SyncResponse = response.json().await?;
        Ok(body.into_app_config(app_id))
    }
}
