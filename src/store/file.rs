//! File-backed store persisting one JSON document per key.
//!
//! Records live in an XDG-compliant cache directory (`~/.cache/timed_cache/`
//! on Linux) unless a directory is given. The directory is created on the
//! first write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

use super::BackingStore;
use crate::cache::StoredRecord;
use crate::error::{CacheError, Result};

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// On-disk layout: the record plus the key it belongs to.
#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    #[serde(default)]
    key: Option<String>,
    #[serde(flatten)]
    record: StoredRecord,
}

/// Stores each record as `<sha256(key)>.json` inside a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    temp_counter: AtomicU64,
}

impl FileStore {
    /// Creates a store in the platform cache directory, or `./.timed_cache`
    /// when no home directory can be determined.
    pub fn new() -> Self {
        let dir = ProjectDirs::from("", "", "timed_cache")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".timed_cache"));
        Self::with_dir(dir)
    }

    /// Creates a store rooted at `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            temp_counter: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir
            .join(format!("{}.{}", hex::encode(digest), RECORD_EXTENSION))
    }

    fn temp_path(&self, record_path: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        record_path.with_extension(format!("{}.{}.{}", std::process::id(), n, TEMP_EXTENSION))
    }

    async fn record_files(&self) -> Result<Vec<PathBuf>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackingStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        let path = self.record_path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<FileRecord>(&bytes) {
            Ok(file) => Ok(Some(file.record)),
            Err(err) => {
                debug!("Unreadable record file {}: {}", path.display(), err);
                Ok(Some(StoredRecord::default()))
            }
        }
    }

    async fn put(&self, key: &str, record: StoredRecord) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let file = FileRecord {
            key: Some(key.to_string()),
            record,
        };
        let bytes =
            serde_json::to_vec(&file).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let path = self.record_path(key);
        let temp = self.temp_path(&path);
        fs::write(&temp, bytes).await?;
        if let Err(err) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for path in self.record_files().await? {
            let Ok(bytes) = fs::read(&path).await else {
                continue;
            };
            if let Ok(FileRecord { key: Some(key), .. }) = serde_json::from_slice::<FileRecord>(&bytes) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.record_files().await? {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(removed)
    }
}
