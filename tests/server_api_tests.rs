use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use tactician::config::AppConfig;
use tactician::server::routes::{router, AppState};
use tactician::server::stream::{NdjsonDecoder, SearchEvent};

fn app() -> Router {
    router(AppState::new(AppConfig {
        max_workers: 2,
        ..AppConfig::default()
    }))
}

async fn call(method: &str, uri: &str, body: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    let response = app().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    (status, content_type, bytes.to_vec())
}

fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("response should be valid json")
}

#[tokio::test]
async fn health_endpoint_returns_ok_json() {
    let (status, content_type, body) = call("GET", "/api/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(json(&body)["status"], "ok");
}

#[tokio::test]
async fn catalog_endpoint_lists_formations() {
    let (status, _, body) = call("GET", "/api/catalog", "").await;
    assert_eq!(status, StatusCode::OK);
    let payload = json(&body);
    let keys: Vec<&str> = payload["formations"]
        .as_array()
        .expect("formations array")
        .iter()
        .filter_map(|entry| entry["key"].as_str())
        .collect();
    assert!(keys.contains(&"4-2-3-1"));
}

#[tokio::test]
async fn single_match_returns_a_match_result() {
    let body = r#"{
        "home": {"attackFormation":"4-3-3","attackStrategy":"possession","defenseStrategy":"forecheck"},
        "away": {"atkFormation":"4-4-2","defFormation":"5-3-2","atkStrategy":"longBall","defStrategy":"retreat","fwType":"Power"}
    }"#;
    let (status, _, body) = call("POST", "/api/single-match", body).await;
    assert_eq!(status, StatusCode::OK);
    let payload = json(&body);
    let home_possession = payload["homePossession"].as_f64().expect("possession");
    let away_possession = payload["awayPossession"].as_f64().expect("possession");
    assert!((home_possession + away_possession - 1.0).abs() < 1e-9);
    assert!(payload["homeGoals"].as_u64().is_some());
    assert!(["home", "away", "draw"].contains(&payload["winner"].as_str().unwrap_or("")));
}

#[tokio::test]
async fn single_match_with_unknown_key_is_rejected() {
    let body = r#"{
        "home": {"formation":"4-3-3","attack":"possession","defense":"forecheck"},
        "away": {"formation":"4-4-4","attack":"longBall","defense":"retreat"}
    }"#;
    let (status, _, body) = call("POST", "/api/single-match", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let payload = json(&body);
    assert_eq!(payload["status"], "error");
    assert!(payload["message"]
        .as_str()
        .unwrap_or_default()
        .contains("4-4-4"));
}

#[tokio::test]
async fn train_endpoint_reports_episodes() {
    let body = r#"{"episodes":40,"space":{"formations":["4-4-2","4-3-3"],"attackStrategies":["possession"]}}"#;
    let (status, _, body) = call("POST", "/api/train", body).await;
    assert_eq!(status, StatusCode::OK);
    let payload = json(&body);
    assert_eq!(payload["totalEpisodes"], 40);
    assert_eq!(payload["stats"]["rewardHistory"].as_array().map(Vec::len), Some(40));
    assert!(payload["ranking"].as_array().is_some());
}

#[tokio::test]
async fn train_endpoint_validates_episode_count() {
    let (status, _, body) = call("POST", "/api/train", r#"{"episodes":0}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let payload = json(&body);
    assert_eq!(payload["message"], "Invalid training request");
    assert_eq!(payload["errors"][0]["field"], "episodes");
}

#[tokio::test]
async fn full_search_streams_ndjson_until_done() {
    let body = r#"{
        "mode": "exhaustive",
        "matchesPerPair": 1,
        "rankingSize": 5,
        "space": {
            "formations": ["4-4-2", "3-4-3"],
            "attackStrategies": ["possession", "longCounter"],
            "defenseStrategies": ["retreat"],
            "forwardArchetypes": ["Speed"],
            "midfielderArchetypes": ["Playmaker"],
            "defenderArchetypes": ["Cover"]
        }
    }"#;
    let (status, content_type, bytes) = call("POST", "/api/full-search", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/x-ndjson"));

    let mut decoder = NdjsonDecoder::new();
    let events: Vec<SearchEvent> = decoder.push(&bytes).expect("every line is a record");
    assert_eq!(decoder.pending(), 0);
    let (last, rest) = events.split_last().expect("at least the terminal record");
    assert!(rest.iter().all(|event| !event.is_terminal()));
    let SearchEvent::Done(summary) = last else {
        panic!("expected done, got {last:?}");
    };
    assert_eq!(summary.total_matches, 64);
    assert_eq!(summary.ranking.len(), 5);
    assert!(summary.worker_count <= 2);
}

#[tokio::test]
async fn full_search_rejects_invalid_config_before_streaming() {
    let (status, content_type, body) =
        call("POST", "/api/full-search", r#"{"matchesPerPair":0}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(json(&body)["errors"][0]["field"], "matchesPerPair");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _, body) = call("GET", "/api/nope", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["status"], "error");
}
