//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::SdkConfig;
use crate::error::SdkError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Per-user config file (`<config dir>/pushlink/config.toml`)
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "pushlink", "pushlink")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from defaults, the user config file and environment.
    pub fn load() -> Result<SdkConfig, SdkError> {
        let config = MergeService::load(Self::user_config_path().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file plus environment.
    pub fn load_from_file(path: &Path) -> Result<SdkConfig, SdkError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default() -> SdkConfig {
        SdkConfig::default()
    }
}
