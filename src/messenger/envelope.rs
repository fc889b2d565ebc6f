//! Message envelope and correlation ids.

use super::command::Command;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identifies a request so its reply can find the waiting caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        CorrelationId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        CorrelationId(id.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What actually crosses the postMessage boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub command: String,
    #[serde(default)]
    pub data: Value,
    pub id: CorrelationId,
    #[serde(default)]
    pub is_reply: bool,
}

impl MessageEnvelope {
    /// Fresh request with a new correlation id
    pub fn request(command: &Command, data: Value) -> Self {
        Self {
            command: command.as_str().to_string(),
            data,
            id: CorrelationId::new(),
            is_reply: false,
        }
    }

    /// Reply echoing this envelope's command and id
    pub fn reply_to(&self, data: Value) -> Self {
        Self {
            command: self.command.clone(),
            data,
            id: self.id.clone(),
            is_reply: true,
        }
    }

    pub fn command(&self) -> Command {
        Command::from(self.command.as_str())
    }
}
