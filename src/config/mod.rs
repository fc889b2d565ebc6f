//! SDK configuration.
//!
//! Loaded once at boot by [`ConfigLoader`]: built-in defaults, then an
//! optional config file, then `PUSHLINK_*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::environment::AppConfig;
use crate::error::SdkError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default bound on the frame load → connect → initialize sequence
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 15_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default)]
    pub app: AppOptions,

    #[serde(default)]
    pub frames: FrameConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SdkConfig {
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.frames.load_timeout_ms == 0 {
            return Err(SdkError::Config(
                "frames.load_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(app_id) = &self.app.app_id {
            if app_id.trim().is_empty() {
                return Err(SdkError::Config("app.app_id is empty".to_string()));
            }
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(SdkError::Config(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                self.logging.format
            )));
        }
        Ok(())
    }
}

/// Site-level options the host page was initialised with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppOptions {
    #[serde(default)]
    pub app_id: Option<String>,

    /// Service subdomain the site subscribes through
    #[serde(default)]
    pub subdomain_name: Option<String>,

    #[serde(default)]
    pub use_legacy_domain: bool,

    /// Free-form init options forwarded verbatim to remote contexts
    #[serde(default)]
    pub init_options: Map<String, Value>,
}

impl AppOptions {
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            app_id: self.app_id.clone(),
            subdomain: self.subdomain_name.clone(),
            use_legacy_domain: self.use_legacy_domain,
        }
    }

    /// Init options as a remote context receives them (`hostInitOptions`)
    pub fn host_init_options(&self) -> Value {
        let mut options = self.init_options.clone();
        if let Some(app_id) = &self.app_id {
            options.insert("appId".to_string(), Value::String(app_id.clone()));
        }
        if let Some(subdomain) = &self.subdomain_name {
            options.insert("subdomainName".to_string(), Value::String(subdomain.clone()));
        }
        Value::Object(options)
    }
}

/// Remote frame handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Remove the frame element when it fails to load in time
    #[serde(default)]
    pub remove_on_timeout: bool,
}

fn default_load_timeout_ms() -> u64 {
    DEFAULT_LOAD_TIMEOUT_MS
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: default_load_timeout_ms(),
            remove_on_timeout: false,
        }
    }
}

impl FrameConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}
