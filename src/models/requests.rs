//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for storing a value (PUT /cache/*key)
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The value to store
    pub value: Value,
}

/// Query string for inspecting an entry (GET /cache/*key)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectQuery {
    /// Freshness window in milliseconds; the configured default when absent
    #[serde(default)]
    pub max_age_ms: Option<u64>,
}
