//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheEntry;

/// Response body for inspecting an entry (GET /cache/*key)
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
    /// Write time in ISO 8601 format
    pub written_at: String,
    /// Milliseconds since the write
    pub age_ms: u64,
}

impl EntryResponse {
    /// Creates a new EntryResponse for an entry read at `now_ms`
    pub fn new(entry: CacheEntry, now_ms: u64) -> Self {
        let written_at = entry
            .written_at_utc()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        Self {
            age_ms: entry.age_ms(now_ms),
            key: entry.key,
            value: entry.value,
            written_at,
        }
    }
}

/// Response body for storing a value (PUT /cache/*key)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl PutResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored", key),
            key,
        }
    }
}

/// Response body for invalidation (DELETE /cache/*key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The key that was invalidated
    pub key: String,
}

impl InvalidateResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for listing keys (GET /cache)
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub count: usize,
    pub keys: Vec<String>,
}

impl KeysResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for clearing the cache (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
