//! Backing Store Module
//!
//! Key/value persistence behind the timed cache.

mod file;
mod memory;

use async_trait::async_trait;

use crate::cache::StoredRecord;
use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

// == Backing Store Trait ==
/// Durable or in-memory storage for cache records.
///
/// Implementations must make `put` atomic per key: a concurrent `get` sees
/// either the previous record or the new one, never a mix. Every failure is
/// reported as [`CacheError::StoreUnavailable`](crate::error::CacheError).
#[async_trait]
pub trait BackingStore: Send + Sync + std::fmt::Debug {
    /// Reads the record stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>>;

    /// Stores `record` under `key`, replacing any previous record.
    async fn put(&self, key: &str, record: StoredRecord) -> Result<()>;

    /// Removes the record under `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Lists every stored key.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Removes every record and returns how many were removed.
    async fn clear(&self) -> Result<usize>;
}
