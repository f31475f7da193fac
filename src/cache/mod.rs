//! Cache Module
//!
//! Read-through caching with per-entry timestamps and read-time freshness checks.

mod clock;
mod entry;
mod key;
mod stats;
mod timed;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, StoredRecord};
pub use key::{validate_key, CacheKey};
pub use stats::{CacheStats, StatsCounters};
pub use timed::TimedCache;

// == Public Constants ==
/// Separator between the endpoint and parameter parts of a key
pub const KEY_SEPARATOR: &str = "_";
