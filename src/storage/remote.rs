//! Storage proxied to another context over a messenger, plus the wire shapes
//! of the storage proxy commands.

use super::record_key;
use crate::collaborators::Storage;
use crate::error::StorageError;
use crate::messenger::{Command, Messenger, REMOTE_OPERATION_COMPLETE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One lookup in a `REMOTE_DATABASE_GET` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    pub table: String,
    pub key: String,
}

/// One write in a `REMOTE_DATABASE_PUT` batch; `keypath` is the full record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insertion {
    pub table: String,
    pub keypath: Value,
}

/// One delete in a `REMOTE_DATABASE_REMOVE` batch
///
/// `keypath` is either the key itself or a record carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Removal {
    pub table: String,
    pub keypath: Value,
}

impl Removal {
    pub fn key(&self) -> Result<String, StorageError> {
        match &self.keypath {
            Value::String(key) => Ok(key.clone()),
            record => record_key(&self.table, record),
        }
    }
}

/// Reply payload carrying an application-level failure
pub fn rejection(reason: impl std::fmt::Display) -> Value {
    json!({"status": "reject", "result": reason.to_string()})
}

fn check_rejected(reply: &Value) -> Result<(), StorageError> {
    if reply.get("status").and_then(Value::as_str) == Some("reject") {
        let reason = reply
            .get("result")
            .map(|r| r.to_string())
            .unwrap_or_default();
        return Err(StorageError::Remote(reason));
    }
    Ok(())
}

/// [`Storage`] answered by the context at the other end of `messenger`
pub struct RemoteStorage {
    messenger: Messenger,
}

impl RemoteStorage {
    pub fn new(messenger: Messenger) -> Self {
        Self { messenger }
    }

    async fn call(&self, command: Command, batch: Value) -> Result<Value, StorageError> {
        let reply = self
            .messenger
            .request(command, batch)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        check_rejected(&reply)?;
        Ok(reply)
    }

    async fn call_for_completion(&self, command: Command, batch: Value) -> Result<(), StorageError> {
        match self.call(command, batch).await? {
            Value::String(s) if s == REMOTE_OPERATION_COMPLETE => Ok(()),
            other => Err(StorageError::Remote(format!("Unexpected reply: {}", other))),
        }
    }
}

#[async_trait]
impl Storage for RemoteStorage {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let batch = serde_json::to_value([Retrieval {
            table: table.to_string(),
            key: key.to_string(),
        }])?;
        match self.call(Command::RemoteDatabaseGet, batch).await? {
            Value::Array(results) => Ok(results.into_iter().next().filter(|v| !v.is_null())),
            other => Err(StorageError::Remote(format!("Unexpected reply: {}", other))),
        }
    }

    async fn put(&self, table: &str, record: Value) -> Result<(), StorageError> {
        record_key(table, &record)?;
        let batch = serde_json::to_value([Insertion {
            table: table.to_string(),
            keypath: record,
        }])?;
        self.call_for_completion(Command::RemoteDatabasePut, batch).await
    }

    async fn remove(&self, table: &str, key: &str) -> Result<(), StorageError> {
        let batch = serde_json::to_value([Removal {
            table: table.to_string(),
            keypath: Value::String(key.to_string()),
        }])?;
        self.call_for_completion(Command::RemoteDatabaseRemove, batch).await
    }
}
