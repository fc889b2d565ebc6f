//! Error types for the cross-context SDK core.

use thiserror::Error;

/// Storage collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("Record for table {table} has no key at path '{key_path}'")]
    MissingKey { table: String, key_path: String },

    #[error("Record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Remote storage error: {0}")]
    Remote(String),
}

/// Errors surfaced by SDK operations
///
/// Protocol-level faults (origin mismatch, unhandled commands) are never
/// represented here; they are logged and dropped at the transport boundary.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Frame at {url} did not load within {after_ms}ms")]
    Timeout { url: String, after_ms: u64 },

    #[error("Could not send event '{event}' back to the host page: no creator (opener or parent) found")]
    NoCreatorReachable { event: String },

    #[error("Refusing to accept messages from any origin; a concrete receive origin is required")]
    UntrustedOrigin,

    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Channel was destroyed before a reply arrived")]
    ChannelDestroyed,

    #[error("Channel is not connected")]
    NotConnected,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("This app is not configured for web push")]
    AppNotConfiguredForWebPush,

    #[error("This page cannot be directly opened and must be opened as a result of a subscription call")]
    DirectlyOpened,

    #[error("Remote operation failed: {0}")]
    Remote(serde_json::Value),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for SdkError {
    fn from(err: config::ConfigError) -> Self {
        SdkError::Config(err.to_string())
    }
}

impl From<url::ParseError> for SdkError {
    fn from(err: url::ParseError) -> Self {
        SdkError::InvalidOrigin(err.to_string())
    }
}
