//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and single-process hosts.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw payload, bypassing serialization. Useful for seeding
    /// documents written by older clients.
    pub fn insert_raw(&self, key: &str, json: &str) -> StorageResult<()> {
        let mut docs = self
            .documents
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        docs.insert(key.to_string(), json.to_string());
        Ok(())
    }

    /// Number of stored documents.
    pub fn len(&self) -> StorageResult<usize> {
        let docs = self
            .documents
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(docs.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.insert_raw(key, json);
        Box::pin(async move { result })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            docs.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }
}
