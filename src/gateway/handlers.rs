//! Gateway Handlers
//!
//! HTTP request handlers for the proxy and the cache admin endpoints.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use reqwest::Client;
use serde_json::Value;

use crate::cache::{CacheKey, CacheStats, TimedCache};
use crate::config::{Config, StoreBackend};
use crate::error::{CacheError, Result};
use crate::gateway::upstream::{fetch_json, Upstream};
use crate::models::{
    ClearResponse, EntryResponse, HealthResponse, InspectQuery, InvalidateResponse, KeysResponse,
    PutRequest, PutResponse,
};
use crate::store::{BackingStore, FileStore, MemoryStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared read-through cache
    pub cache: Arc<TimedCache>,
    /// Proxied upstreams by name
    pub upstreams: Arc<HashMap<String, Upstream>>,
    /// HTTP client for upstream requests
    pub client: Client,
    /// Freshness window for admin reads without `max_age_ms`
    pub default_max_age: Duration,
}

impl AppState {
    /// Creates a new AppState around the given cache and upstreams.
    pub fn new(
        cache: TimedCache,
        upstreams: Vec<Upstream>,
        client: Client,
        default_max_age: Duration,
    ) -> Self {
        let upstreams = upstreams
            .into_iter()
            .map(|u| (u.name.clone(), u))
            .collect();
        Self {
            cache: Arc::new(cache),
            upstreams: Arc::new(upstreams),
            client,
            default_max_age,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured backing store and builds the upstream HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn BackingStore> = match config.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => match &config.cache_dir {
                Some(dir) => Arc::new(FileStore::with_dir(dir)),
                None => Arc::new(FileStore::new()),
            },
        };
        let cache = TimedCache::new(store).fail_open(config.fail_open);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| CacheError::Upstream(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self::new(
            cache,
            config.upstreams.clone(),
            client,
            config.default_max_age(),
        ))
    }
}

/// Handler for GET /proxy/:source/*path
///
/// Serves the upstream response from cache when fresh, otherwise fetches it
/// and caches it under a key derived from the source, path and query pairs.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path((source, path)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>> {
    let upstream = state
        .upstreams
        .get(&source)
        .ok_or_else(|| CacheError::UnknownSource(source.clone()))?;

    let path = path.trim_matches('/').to_string();
    let key = proxy_key(&source, &path, &params)?;

    let value = state
        .cache
        .fetch_with_cache(&key, upstream.max_age, || {
            fetch_json(&state.client, upstream, &path, &params)
        })
        .await?;

    Ok(Json(value))
}

/// Cache key for a proxied request.
///
/// Without a query the key is `source/path`. With one, `?` closes the path
/// and each pair follows as `name_value` in request order, so an underscore
/// in the path never reads as a query pair. Paths containing `?` (sent
/// percent-encoded) are rejected.
pub fn proxy_key(source: &str, path: &str, params: &[(String, String)]) -> Result<String> {
    if path.contains('?') {
        return Err(CacheError::InvalidKey(format!(
            "Proxy path cannot contain '?': {}",
            path
        )));
    }
    if params.is_empty() {
        return Ok(format!("{}/{}", source, path));
    }

    let key = params
        .iter()
        .fold(CacheKey::new(format!("{}/{}?", source, path)), |key, (name, value)| {
            key.named(name, value)
        });
    Ok(key.build())
}

/// Handler for GET /cache/*key
///
/// Returns the entry if it is fresh within `max_age_ms` (or the default window).
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<InspectQuery>,
) -> Result<Json<EntryResponse>> {
    let max_age = query
        .max_age_ms
        .map(Duration::from_millis)
        .unwrap_or(state.default_max_age);

    let entry = state
        .cache
        .get_entry(&key, max_age)
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse::new(entry, state.cache.now_ms())))
}

/// Handler for PUT /cache/*key
pub async fn put_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    state.cache.put(&key, &req.value).await?;
    Ok(Json(PutResponse::new(key)))
}

/// Handler for DELETE /cache/*key
///
/// Succeeds whether or not the key existed.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    state.cache.invalidate(&key).await?;
    Ok(Json(InvalidateResponse::new(key)))
}

/// Handler for GET /cache
pub async fn keys_handler(State(state): State<AppState>) -> Result<Json<KeysResponse>> {
    let keys = state.cache.keys().await?;
    Ok(Json(KeysResponse::new(keys)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.cache.clear().await?;
    Ok(Json(ClearResponse { removed }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
