//! Diagnostic CLI
//!
//! Inspects how the SDK would classify a window, which service origins an app
//! resolves to, and the effective configuration.

use crate::api_client::HttpAppConfigSource;
use crate::collaborators::AppConfigSource;
use crate::config::{ConfigLoader, SdkConfig};
use crate::environment::{
    canonical_subscription_urls, classify, subscription_popup_url, AmbientContext, AppConfig,
    BuildMode,
};
use crate::error::SdkError;
use crate::logging::LoggingConfig;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use url::Url;

/// Pushlink - cross-context messaging core for web push
#[derive(Parser)]
#[command(name = "pushlink")]
#[command(about = "Inspect window classification, service origins and configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildArg {
    Development,
    Staging,
    Production,
}

impl From<BuildArg> for BuildMode {
    fn from(arg: BuildArg) -> Self {
        match arg {
            BuildArg::Development => BuildMode::Development,
            BuildArg::Staging => BuildMode::Staging,
            BuildArg::Production => BuildMode::Production,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the role of a window at a URL
    Classify {
        /// Location of the window
        url: Url,
        /// The window is nested inside another (an iframe)
        #[arg(long)]
        nested: bool,
        /// Build mode the SDK runs as (defaults to the compiled mode)
        #[arg(long, value_enum)]
        build: Option<BuildArg>,
    },
    /// List the service origins for a subdomain
    SubscriptionUrls {
        subdomain: String,
        /// Only use the long legacy domain
        #[arg(long)]
        legacy: bool,
        #[arg(long, value_enum)]
        build: Option<BuildArg>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Fetch an app's configuration from the service API
    AppConfig {
        app_id: String,
        #[arg(long, value_enum)]
        build: Option<BuildArg>,
    },
    /// Show the effective configuration
    Config,
}

impl Cli {
    /// Logging settings from the config file with command-line overrides applied
    pub fn logging_config(&self, config: &SdkConfig) -> LoggingConfig {
        let mut logging = config.logging.clone();
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if self.log_file.is_some() {
            logging.file = self.log_file.clone();
        }
        logging
    }

    pub fn load_config(&self) -> Result<SdkConfig, SdkError> {
        match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }
}

/// Run one command and render its output
pub async fn execute(command: &Commands, config: &SdkConfig) -> Result<String, SdkError> {
    match command {
        Commands::Classify { url, nested, build } => {
            let ambient = if *nested {
                AmbientContext::nested_frame(url.clone())
            } else {
                AmbientContext::top_window(url.clone())
            };
            let ambient = ambient.with_build(build.map(BuildMode::from).unwrap_or_default());
            Ok(classify(&ambient).to_string())
        }
        Commands::SubscriptionUrls {
            subdomain,
            legacy,
            build,
            format,
        } => {
            let app = AppConfig {
                app_id: None,
                subdomain: Some(subdomain.clone()),
                use_legacy_domain: *legacy,
            };
            let build = build.map(BuildMode::from).unwrap_or_default();
            let urls = canonical_subscription_urls(&app, build)?;
            let popup = subscription_popup_url(&app, build)?;
            if format == "json" {
                let rendered = json!({
                    "build": build.to_string(),
                    "origins": urls.iter().map(|u| u.origin().ascii_serialization()).collect::<Vec<_>>(),
                    "popup": popup.as_str(),
                });
                Ok(serde_json::to_string_pretty(&rendered)?)
            } else {
                let mut lines: Vec<String> = urls
                    .iter()
                    .map(|u| u.origin().ascii_serialization())
                    .collect();
                lines.push(format!("popup: {}", popup));
                Ok(lines.join("\n"))
            }
        }
        Commands::AppConfig { app_id, build } => {
            let source = HttpAppConfigSource::new(build.map(BuildMode::from).unwrap_or_default())?;
            let app = source.get_app_config(app_id).await?;
            Ok(serde_json::to_string_pretty(&app)?)
        }
        Commands::Config => Ok(serde_json::to_string_pretty(config)?),
    }
}
