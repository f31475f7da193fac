//! Gateway Routes
//!
//! Configures the Axum router with the proxy and cache admin endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, get_entry_handler, health_handler, invalidate_handler, keys_handler,
    proxy_handler, put_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// Cache keys may contain `/`, so the admin routes capture the rest of the
/// path as the key.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/proxy/:source/*path", get(proxy_handler))
        .route("/cache", get(keys_handler).delete(clear_handler))
        .route(
            "/cache/*key",
            put(put_handler)
                .get(get_entry_handler)
                .delete(invalidate_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
