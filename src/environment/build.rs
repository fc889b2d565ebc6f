//! Build mode: development, staging or production.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build flavour the SDK was compiled for
///
/// Selected at compile time through the `development` and `staging` cargo
/// features. Gates the API origin, filename prefixes and whether local
/// hostnames count as the service's own domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Staging,
    Production,
}

impl BuildMode {
    /// Build mode baked in at compile time
    pub const fn current() -> Self {
        if cfg!(feature = "development") {
            BuildMode::Development
        } else if cfg!(feature = "staging") {
            BuildMode::Staging
        } else {
            BuildMode::Production
        }
    }

    /// Filename prefix for build-specific assets such as the service worker script
    pub fn prefix(self) -> &'static str {
        match self {
            BuildMode::Development => "Dev-",
            BuildMode::Staging => "Staging-",
            BuildMode::Production => "",
        }
    }

    /// Base URL of the REST API for this build
    pub fn api_url(self) -> &'static str {
        match self {
            BuildMode::Development => "https://localhost:3001/api/v1/",
            BuildMode::Staging => "https://onesignal-staging.pw/api/v1/",
            BuildMode::Production => "https://onesignal.com/api/v1/",
        }
    }

    /// Apply the build prefix to an asset filename
    pub fn prefixed(self, filename: &str) -> String {
        format!("{}{}", self.prefix(), filename)
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        BuildMode::current()
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildMode::Development => "development",
            BuildMode::Staging => "staging",
            BuildMode::Production => "production",
        };
        f.write_str(name)
    }
}
