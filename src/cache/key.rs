//! Cache Key Module
//!
//! Deterministic key derivation from an endpoint name and ordered parameters.

use std::fmt::{self, Display};

use crate::cache::KEY_SEPARATOR;
use crate::error::{CacheError, Result};

// == Cache Key ==
/// Builder for cache keys.
///
/// The endpoint and every parameter part are joined with `_` in the order
/// they were added:
///
/// ```
/// use timed_cache::cache::CacheKey;
///
/// let key = CacheKey::new("topScorers").param(2021).param(39);
/// assert_eq!(key.build(), "topScorers_2021_39");
///
/// let key = CacheKey::new("players/topscorers")
///     .named("season", 2021)
///     .named("league", 39);
/// assert_eq!(key.build(), "players/topscorers_season_2021_league_39");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    endpoint: String,
    parts: Vec<String>,
}

impl CacheKey {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            parts: Vec::new(),
        }
    }

    /// Appends a bare parameter value.
    pub fn param(mut self, value: impl Display) -> Self {
        self.parts.push(value.to_string());
        self
    }

    /// Appends a parameter as `name_value`.
    pub fn named(mut self, name: &str, value: impl Display) -> Self {
        self.parts.push(format!("{name}{KEY_SEPARATOR}{value}"));
        self
    }

    /// Joins endpoint and parameters into the final key string.
    pub fn build(&self) -> String {
        std::iter::once(self.endpoint.as_str())
            .chain(self.parts.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.build()
    }
}

// == Validation ==
/// Rejects empty keys. Length is unbounded.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    Ok(())
}
