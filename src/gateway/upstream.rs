//! Upstream APIs
//!
//! Third-party JSON APIs the gateway proxies, each with its own freshness
//! window, and the fetch function used on a cache miss.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

const MINUTE_MS: u64 = 60 * 1000;
const HOUR_MS: u64 = 60 * MINUTE_MS;

// == Upstream ==
/// A proxied API: where it lives and how long its responses stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Name used in `/proxy/{name}/...`
    pub name: String,
    /// Base URL that request paths are appended to
    pub base_url: String,
    /// Freshness window for cached responses
    pub max_age: Duration,
    /// Extra request headers (API keys, client ids)
    pub headers: Vec<(String, String)>,
}

impl Upstream {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            max_age,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Coin market prices move quickly: 10 minutes.
    pub fn coingecko() -> Self {
        Self::new(
            "coingecko",
            "https://api.coingecko.com/api/v3",
            Duration::from_millis(10 * MINUTE_MS),
        )
    }

    /// League, season, team and player statistics: 24 hours.
    pub fn football() -> Self {
        Self::new(
            "football",
            "https://v3.football.api-sports.io",
            Duration::from_millis(24 * HOUR_MS),
        )
    }

    /// Top games and streamers: 10 hours.
    pub fn twitch() -> Self {
        Self::new(
            "twitch",
            "https://api.twitch.tv/helix",
            Duration::from_millis(10 * HOUR_MS),
        )
    }

    /// Domain reports: 24 hours.
    pub fn virustotal() -> Self {
        Self::new(
            "virustotal",
            "https://www.virustotal.com/api/v3",
            Duration::from_millis(24 * HOUR_MS),
        )
    }

    /// All built-in upstreams.
    pub fn presets() -> Vec<Self> {
        vec![
            Self::coingecko(),
            Self::football(),
            Self::twitch(),
            Self::virustotal(),
        ]
    }

    /// Full URL for `path` under this upstream.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

// == Fetch ==
/// Performs a GET against the upstream and parses the JSON body.
///
/// Transport errors, non-success statuses and non-JSON bodies all become
/// [`CacheError::Upstream`].
pub async fn fetch_json(
    client: &Client,
    upstream: &Upstream,
    path: &str,
    query: &[(String, String)],
) -> Result<Value> {
    let url = upstream.url_for(path);
    debug!("Fetching upstream {}: {}", upstream.name, url);

    let mut request = client.get(&url).query(query);
    for (name, value) in &upstream.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await.map_err(|e| {
        warn!("Upstream {} unreachable: {}", upstream.name, e);
        CacheError::Upstream(format!("{}: {}", upstream.name, e))
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!("Upstream {} returned {}", upstream.name, status);
        return Err(CacheError::Upstream(format!(
            "{} returned {}",
            upstream.name, status
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| CacheError::Upstream(format!("{}: invalid JSON body: {}", upstream.name, e)))
}
