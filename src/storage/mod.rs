//! Storage collaborator implementations
//!
//! Records are JSON objects. Each table names the field that holds a
//! record's key (its key path); `get` hands back the interesting part of the
//! record rather than the whole object for the keyed-value tables.

pub mod remote;
pub mod sled_store;

pub use remote::RemoteStorage;
pub use sled_store::SledStorage;

use crate::collaborators::Storage;
use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

pub const IDS_TABLE: &str = "Ids";
pub const OPTIONS_TABLE: &str = "Options";
pub const NOTIFICATION_OPENED_TABLE: &str = "NotificationOpened";

/// Field holding the key of records in `table`
pub fn key_path(table: &str) -> &'static str {
    match table {
        IDS_TABLE => "type",
        OPTIONS_TABLE => "key",
        NOTIFICATION_OPENED_TABLE => "url",
        _ => "id",
    }
}

/// The key of `record` under its table's key path
pub fn record_key(table: &str, record: &Value) -> Result<String, StorageError> {
    let path = key_path(table);
    match record.get(path) {
        Some(Value::String(key)) => Ok(key.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(StorageError::MissingKey {
            table: table.to_string(),
            key_path: path.to_string(),
        }),
    }
}

/// What `get` returns for a stored record
///
/// `Ids` records yield their `id`, `Options` records their `value`, other
/// tables the whole record.
pub fn record_value(table: &str, record: Value) -> Option<Value> {
    let field = match table {
        IDS_TABLE => "id",
        OPTIONS_TABLE => "value",
        _ => return Some(record),
    };
    match record {
        Value::Object(mut map) => map.remove(field),
        _ => None,
    }
}

/// In-process storage
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw record stored under `key`
    pub fn record(&self, table: &str, key: &str) -> Option<Value> {
        self.tables.read().get(table)?.get(key).cloned()
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self
            .record(table, key)
            .and_then(|record| record_value(table, record)))
    }

    async fn put(&self, table: &str, record: Value) -> Result<(), StorageError> {
        let key = record_key(table, &record)?;
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key, record);
        Ok(())
    }

    async fn remove(&self, table: &str, key: &str) -> Result<(), StorageError> {
        if let Some(records) = self.tables.write().get_mut(table) {
            records.remove(key);
        }
        Ok(())
    }
}
