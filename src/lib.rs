//! Timed Cache - A read-through response cache
//!
//! Caches the results of asynchronous fetches under deterministic keys, with
//! per-entry write timestamps and caller-chosen freshness windows. Ships with
//! in-memory and file-backed stores and a caching HTTP gateway.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod store;

pub use cache::{CacheKey, TimedCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use gateway::AppState;
