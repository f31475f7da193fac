//! Gateway Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `GET /proxy/:source/*path` - Read-through proxy to a configured upstream
//! - `GET /cache` - List cached keys
//! - `DELETE /cache` - Remove every entry
//! - `GET /cache/*key` - Inspect a fresh entry
//! - `PUT /cache/*key` - Store a value
//! - `DELETE /cache/*key` - Invalidate a key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;
pub mod upstream;

pub use handlers::*;
pub use routes::create_router;
pub use upstream::{fetch_json, Upstream};
