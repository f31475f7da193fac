//! Configuration Module
//!
//! Handles loading gateway and cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::gateway::Upstream;

/// Default freshness window used when none is given (10 hours).
pub const DEFAULT_MAX_AGE_MS: u64 = 10 * 60 * 60 * 1000;

// == Store Backend ==
/// Which backing store the gateway uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "file" | "disk" => Some(StoreBackend::File),
            _ => None,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Backing store kind
    pub backend: StoreBackend,
    /// Directory for the file store (platform cache dir when None)
    pub cache_dir: Option<PathBuf>,
    /// Freshness window for admin reads without an explicit `max_age_ms`
    pub default_max_age_ms: u64,
    /// Treat store failures during proxying as cache misses
    pub fail_open: bool,
    /// Timeout for upstream requests in seconds
    pub upstream_timeout_secs: u64,
    /// Upstream APIs reachable through the proxy
    pub upstreams: Vec<Upstream>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_BACKEND` - `memory` or `file` (default: file)
    /// - `CACHE_DIR` - File store directory (default: platform cache dir)
    /// - `DEFAULT_MAX_AGE_MS` - Default freshness window (default: 10 hours)
    /// - `FAIL_OPEN` - `true` to proxy through store failures (default: false)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    /// - `UPSTREAMS` - `name=base_url@max_age_ms,...` (default: built-in presets)
    /// - `UPSTREAM_HEADERS` - `name:Header-Name=value;...`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_max_age_ms = lookup("DEFAULT_MAX_AGE_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_max_age_ms);

        let mut upstreams = match lookup("UPSTREAMS") {
            Some(spec) => parse_upstreams(&spec, default_max_age_ms),
            None => defaults.upstreams,
        };
        if let Some(spec) = lookup("UPSTREAM_HEADERS") {
            apply_upstream_headers(&mut upstreams, &spec);
        }

        Self {
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            backend: lookup("CACHE_BACKEND")
                .and_then(|v| StoreBackend::parse(&v))
                .unwrap_or(defaults.backend),
            cache_dir: lookup("CACHE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            default_max_age_ms,
            fail_open: lookup("FAIL_OPEN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fail_open),
            upstream_timeout_secs: lookup("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),
            upstreams,
        }
    }

    pub fn default_max_age(&self) -> Duration {
        Duration::from_millis(self.default_max_age_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            backend: StoreBackend::File,
            cache_dir: None,
            default_max_age_ms: DEFAULT_MAX_AGE_MS,
            fail_open: false,
            upstream_timeout_secs: 10,
            upstreams: Upstream::presets(),
        }
    }
}

/// Parses `name=base_url@max_age_ms` entries separated by commas.
///
/// A missing `@max_age_ms` uses `default_max_age_ms`. Malformed entries are
/// skipped.
fn parse_upstreams(spec: &str, default_max_age_ms: u64) -> Vec<Upstream> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry.split_once('=').and_then(|(name, rest)| {
                let (url, max_age_ms) = match rest.rsplit_once('@') {
                    Some((url, ms)) => (url, ms.trim().parse().ok()?),
                    None => (rest, default_max_age_ms),
                };
                let (name, url) = (name.trim(), url.trim());
                if name.is_empty() || url.is_empty() {
                    return None;
                }
                Some(Upstream::new(name, url, Duration::from_millis(max_age_ms)))
            });
            if parsed.is_none() {
                warn!("Ignoring malformed upstream entry: {}", entry);
            }
            parsed
        })
        .collect()
}

/// Applies `name:Header-Name=value` entries separated by semicolons.
fn apply_upstream_headers(upstreams: &mut [Upstream], spec: &str) {
    for entry in spec.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let parsed = entry.split_once(':').and_then(|(name, header)| {
            let (header, value) = header.split_once('=')?;
            Some((name.trim(), header.trim(), value.trim()))
        });

        match parsed {
            Some((name, header, value)) if !header.is_empty() => {
                match upstreams.iter_mut().find(|u| u.name == name) {
                    Some(upstream) => upstream.headers.push((header.to_string(), value.to_string())),
                    None => warn!("Header given for unknown upstream: {}", name),
                }
            }
            _ => warn!("Ignoring malformed upstream header entry: {}", entry),
        }
    }
}
