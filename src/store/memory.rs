//! In-memory backing store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BackingStore;
use crate::cache::StoredRecord;
use crate::error::Result;

/// HashMap-backed store guarded by an async read/write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current number of records.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, record: StoredRecord) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}
