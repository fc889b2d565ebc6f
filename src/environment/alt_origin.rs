//! Alternate-origin URLs for sites subscribing through a service subdomain.

use super::build::BuildMode;
use super::window_role::SUBSCRIBE_PATH;
use crate::error::SdkError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Server-side app configuration relevant to origin resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub app_id: Option<String>,
    /// Service subdomain the site subscribes through
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Only use the long legacy domain, not the short one
    #[serde(default)]
    pub use_legacy_domain: bool,
}

/// URLs where the push subscription and site data live
///
/// The legacy long-domain origin always comes first. Apps not pinned to the
/// legacy domain also get the short-domain origin, which fits native
/// notification UIs better.
pub fn canonical_subscription_urls(
    config: &AppConfig,
    build: BuildMode,
) -> Result<Vec<Url>, SdkError> {
    let subdomain = config
        .subdomain
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(SdkError::AppNotConfiguredForWebPush)?;

    let legacy = match build {
        BuildMode::Development => format!("https://{}.localhost:3001", subdomain),
        BuildMode::Staging => format!("https://{}.onesignal-staging.pw", subdomain),
        BuildMode::Production => format!("https://{}.onesignal.com", subdomain),
    };
    let mut urls = vec![Url::parse(&legacy)?];

    if !config.use_legacy_domain {
        let short = match build {
            BuildMode::Development => format!("https://{}.os.tc:3001", subdomain),
            BuildMode::Staging | BuildMode::Production => format!("https://{}.os.tc", subdomain),
        };
        urls.push(Url::parse(&short)?);
    }

    Ok(urls)
}

/// URL of the subscription popup page
pub fn subscription_popup_url(config: &AppConfig, build: BuildMode) -> Result<Url, SdkError> {
    let mut url = canonical_subscription_urls(config, build)?.remove(0);
    url.set_path(SUBSCRIBE_PATH);
    Ok(url)
}
