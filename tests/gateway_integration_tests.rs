//! Integration Tests for Gateway Endpoints
//!
//! Tests the full request/response cycle against a local fake upstream that
//! counts how often it is actually called.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use timed_cache::cache::{ManualClock, TimedCache};
use timed_cache::gateway::{create_router, Upstream};
use timed_cache::store::MemoryStore;
use timed_cache::AppState;
use tower::ServiceExt;

const HOUR: Duration = Duration::from_secs(60 * 60);

// == Fake Upstream ==

async fn top_scorers(
    State(hits): State<Arc<AtomicUsize>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "parameters": query,
        "response": [{"player": "Mohamed Salah", "goals": 23}]
    }))
}

async fn broken(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Starts the fake upstream on an ephemeral port and returns its base URL
/// plus its request counter.
async fn spawn_upstream() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/players/topscorers", get(top_scorers))
        .route("/leagues", get(top_scorers))
        .route("/leagues_season_2021", get(top_scorers))
        .route("/broken", get(broken))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

// == Helper Functions ==

struct TestGateway {
    app: Router,
    hits: Arc<AtomicUsize>,
    clock: ManualClock,
}

async fn create_test_gateway() -> TestGateway {
    let (base_url, hits) = spawn_upstream().await;
    let clock = ManualClock::new(1_700_000_000_000);
    let cache = TimedCache::with_clock(Arc::new(MemoryStore::new()), Arc::new(clock.clone()));
    let state = AppState::new(
        cache,
        vec![Upstream::new("football", base_url, 24 * HOUR)],
        reqwest::Client::new(),
        HOUR,
    );

    TestGateway {
        app: create_router(state),
        hits,
        clock,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Proxy Tests ==

#[tokio::test]
async fn test_identical_requests_hit_upstream_once() {
    let gw = create_test_gateway().await;
    let uri = "/proxy/football/players/topscorers?season=2021&league=39";

    let first = send(&gw.app, "GET", uri, Body::empty()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_to_json(first).await;

    let second = send(&gw.app, "GET", uri, Body::empty()).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_to_json(second).await;

    assert_eq!(gw.hits.load(Ordering::SeqCst), 1);
    assert_eq!(first, second, "Cached response must have the same shape");
    assert_eq!(first["parameters"]["season"], "2021");
}

#[tokio::test]
async fn test_different_parameter_refetches() {
    let gw = create_test_gateway().await;

    send(&gw.app, "GET", "/proxy/football/players/topscorers?season=2021&league=39", Body::empty()).await;
    send(&gw.app, "GET", "/proxy/football/players/topscorers?season=2022&league=39", Body::empty()).await;

    assert_eq!(gw.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expired_response_refetches() {
    let gw = create_test_gateway().await;
    let uri = "/proxy/football/players/topscorers?season=2021";

    send(&gw.app, "GET", uri, Body::empty()).await;
    gw.clock.advance(Duration::from_secs(25 * 60 * 60).as_millis() as u64);
    let response = send(&gw.app, "GET", uri, Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gw.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_upstream_failure_is_not_cached() {
    let gw = create_test_gateway().await;

    let response = send(&gw.app, "GET", "/proxy/football/broken", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("500"));

    let keys = body_to_json(send(&gw.app, "GET", "/cache", Body::empty()).await).await;
    assert_eq!(keys["count"], 0);

    send(&gw.app, "GET", "/proxy/football/broken", Body::empty()).await;
    assert_eq!(gw.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_underscore_path_does_not_share_query_entry() {
    let gw = create_test_gateway().await;

    let with_query = send(&gw.app, "GET", "/proxy/football/leagues?season=2021", Body::empty()).await;
    assert_eq!(with_query.status(), StatusCode::OK);
    let with_query = body_to_json(with_query).await;

    let with_path = send(&gw.app, "GET", "/proxy/football/leagues_season_2021", Body::empty()).await;
    assert_eq!(with_path.status(), StatusCode::OK);
    let with_path = body_to_json(with_path).await;

    assert_eq!(gw.hits.load(Ordering::SeqCst), 2);
    assert_eq!(with_query["parameters"]["season"], "2021");
    assert_eq!(with_path["parameters"], json!({}));
}

#[tokio::test]
async fn test_long_query_is_cached() {
    let gw = create_test_gateway().await;
    let uri = format!("/proxy/football/players/topscorers?team={}", "a".repeat(300));

    for _ in 0..2 {
        let response = send(&gw.app, "GET", &uri, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(gw.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_upstream_not_found() {
    let gw = create_test_gateway().await;

    let response = send(&gw.app, "GET", "/proxy/twitch/games/top", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(gw.hits.load(Ordering::SeqCst), 0);
}

// == Admin Tests ==

#[tokio::test]
async fn test_proxied_entry_is_inspectable_and_invalidatable() {
    let gw = create_test_gateway().await;
    send(&gw.app, "GET", "/proxy/football/players/topscorers?season=2021&league=39", Body::empty()).await;

    let key_uri = "/cache/football/players/topscorers%3F_season_2021_league_39";
    let response = send(&gw.app, "GET", key_uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["key"], "football/players/topscorers?_season_2021_league_39");
    assert_eq!(json["value"]["response"][0]["goals"], 23);

    let response = send(&gw.app, "DELETE", key_uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    send(&gw.app, "GET", "/proxy/football/players/topscorers?season=2021&league=39", Body::empty()).await;
    assert_eq!(gw.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_put_get_and_expiry() {
    let gw = create_test_gateway().await;

    let response = send(
        &gw.app,
        "PUT",
        "/cache/topScorers_2021_39",
        Body::from(r#"{"value":{"goals":30}}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    gw.clock.advance(60 * 60 * 1000);
    let response = send(
        &gw.app,
        "GET",
        "/cache/topScorers_2021_39?max_age_ms=86400000",
        Body::empty(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["value"], json!({"goals": 30}));
    assert_eq!(json["age_ms"], 3_600_000);

    gw.clock.advance(24 * 60 * 60 * 1000);
    let response = send(
        &gw.app,
        "GET",
        "/cache/topScorers_2021_39?max_age_ms=86400000",
        Body::empty(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_window_applies_without_query() {
    let gw = create_test_gateway().await;

    send(&gw.app, "PUT", "/cache/crypto_data", Body::from(r#"{"value":[1]}"#)).await;
    gw.clock.advance(HOUR.as_millis() as u64 + 1);

    let response = send(&gw.app, "GET", "/cache/crypto_data", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalidate_absent_key_is_ok() {
    let gw = create_test_gateway().await;

    let response = send(&gw.app, "DELETE", "/cache/never_set", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_put_and_get_long_key() {
    let gw = create_test_gateway().await;
    let uri = format!("/cache/virustotal/domains/{}", "a".repeat(250));

    let response = send(&gw.app, "PUT", &uri, Body::from(r#"{"value":1}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&gw.app, "GET", &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["value"], 1);
}

#[tokio::test]
async fn test_put_invalid_body() {
    let gw = create_test_gateway().await;

    let response = send(&gw.app, "PUT", "/cache/k", Body::from(r#"{"nope":1}"#)).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_clear_and_list() {
    let gw = create_test_gateway().await;
    send(&gw.app, "PUT", "/cache/a", Body::from(r#"{"value":1}"#)).await;
    send(&gw.app, "PUT", "/cache/b", Body::from(r#"{"value":2}"#)).await;

    let keys = body_to_json(send(&gw.app, "GET", "/cache", Body::empty()).await).await;
    assert_eq!(keys["keys"], json!(["a", "b"]));

    let cleared = body_to_json(send(&gw.app, "DELETE", "/cache", Body::empty()).await).await;
    assert_eq!(cleared["removed"], 2);

    let keys = body_to_json(send(&gw.app, "GET", "/cache", Body::empty()).await).await;
    assert_eq!(keys["count"], 0);
}

#[tokio::test]
async fn test_stats_reflect_proxy_traffic() {
    let gw = create_test_gateway().await;
    let uri = "/proxy/football/players/topscorers?season=2021";

    send(&gw.app, "GET", uri, Body::empty()).await;
    send(&gw.app, "GET", uri, Body::empty()).await;
    send(&gw.app, "GET", "/proxy/football/broken", Body::empty()).await;

    let stats = body_to_json(send(&gw.app, "GET", "/stats", Body::empty()).await).await;
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 2);
    assert_eq!(stats["fetches"], 2);
    assert_eq!(stats["fetch_failures"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let gw = create_test_gateway().await;

    let response = send(&gw.app, "GET", "/health", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
}
