//! Error types for the cache and gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and the gateway built on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Backing store could not be opened, read or written
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Key is empty
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value could not be serialized for storage
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// No fresh entry for the requested key
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Proxy request named an upstream that is not configured
    #[error("Unknown upstream: {0}")]
    UnknownSource(String),

    /// Upstream request failed or returned a non-success status
    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

impl CacheError {
    /// Returns true for failures of the backing store itself.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, CacheError::StoreUnavailable(_))
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) | CacheError::UnknownSource(_) => StatusCode::NOT_FOUND,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
