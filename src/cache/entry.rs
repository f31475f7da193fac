//! Cache Entry Module
//!
//! Defines stored records and the validated entries built from them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// == Stored Record ==
/// A record as held by a backing store.
///
/// Both fields are optional so that records left behind by older or broken
/// writers can be read and recognised as malformed instead of failing to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    /// The cached payload; `Some(Value::Null)` for a stored `null`
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    /// Write timestamp (Unix milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written_at: Option<u64>,
}

/// Any present `value` field, `null` included, deserializes to `Some`.
/// Only an absent field falls back to `None` through `#[serde(default)]`.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl StoredRecord {
    /// Creates a complete record.
    pub fn new(value: Value, written_at: u64) -> Self {
        Self {
            value: Some(value),
            written_at: Some(written_at),
        }
    }

    /// Converts into a [`CacheEntry`], or `None` if a field is missing.
    pub fn into_entry(self, key: &str) -> Option<CacheEntry> {
        match (self.value, self.written_at) {
            (Some(value), Some(written_at)) => Some(CacheEntry {
                key: key.to_string(),
                value,
                written_at,
            }),
            _ => None,
        }
    }
}

// == Cache Entry ==
/// A complete cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The key the entry is stored under
    pub key: String,
    /// The stored value
    pub value: Value,
    /// Write timestamp (Unix milliseconds)
    pub written_at: u64,
}

impl CacheEntry {
    // == Age ==
    /// Milliseconds elapsed between the write and `now_ms`.
    ///
    /// A write stamped after `now_ms` (clock skew between processes sharing a
    /// file store) counts as age zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.written_at)
    }

    // == Is Fresh ==
    /// Checks the entry against a caller-supplied freshness window.
    ///
    /// Boundary condition: an entry whose age equals `max_age` exactly is
    /// still fresh; it turns stale one millisecond later.
    pub fn is_fresh(&self, now_ms: u64, max_age: Duration) -> bool {
        u128::from(self.age_ms(now_ms)) <= max_age.as_millis()
    }

    /// Write timestamp as a UTC date-time, if representable.
    pub fn written_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.written_at).ok()?)
    }
}
