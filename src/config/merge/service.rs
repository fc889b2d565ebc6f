//! MergeService: orchestrates sources and deserializes to SdkConfig.

use crate::config::sources::{environment, file};
use crate::config::{SdkConfig, DEFAULT_LOAD_TIMEOUT_MS};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> optional file -> environment (highest).
    pub fn load(optional_file: Option<&Path>) -> Result<SdkConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = match optional_file {
            Some(path) => file::add_to_builder(builder, path, false)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Like [`MergeService::load`], but the file must exist.
    pub fn load_from_file(path: &Path) -> Result<SdkConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = file::add_to_builder(builder, path, true)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("frames.load_timeout_ms", DEFAULT_LOAD_TIMEOUT_MS)?
        .set_default("frames.remove_on_timeout", false)?
        .set_default("app.use_legacy_domain", false)
}
