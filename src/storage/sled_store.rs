//! sled-backed storage; one tree per table, JSON records.

use super::{record_key, record_value};
use crate::collaborators::Storage;
use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_db(sled::open(path)?))
    }

    /// Database removed when dropped
    pub fn temporary() -> Result<Self, StorageError> {
        Ok(Self::from_db(sled::Config::new().temporary(true).open()?))
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Storage for SledStorage {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let tree = self.db.open_tree(table)?;
        match tree.get(key.as_bytes())? {
            Some(bytes) => {
                let record: Value = serde_json::from_slice(&bytes)?;
                Ok(record_value(table, record))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, table: &str, record: Value) -> Result<(), StorageError> {
        let key = record_key(table, &record)?;
        let tree = self.db.open_tree(table)?;
        tree.insert(key.as_bytes(), serde_json::to_vec(&record)?)?;
        Ok(())
    }

    async fn remove(&self, table: &str, key: &str) -> Result<(), StorageError> {
        self.db.open_tree(table)?.remove(key.as_bytes())?;
        Ok(())
    }
}
