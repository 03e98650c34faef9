mod support;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::models::{NetworkState, ThemePreference};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use sun_service::assets::{APP_ASSETS, OfflineAssetStore};
use sun_service::build_router;
use sun_service::db::{SqliteKvStore, create_pool};
use sun_service::fetcher::SunDataFetcher;
use sun_service::geocoder::{CitySearch, GeocodingClient};
use sun_service::handlers::AppState;
use sun_service::network::NetworkStatus;
use sun_service::orchestrator::Orchestrator;
use sun_service::store::CacheStore;
use sun_service::view::ViewState;
use support::{http_client, sun_body};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app(server: &MockServer, asset_dir: &std::path::Path, online: bool) -> axum::Router {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    let client = http_client(Duration::from_secs(2));

    let network = Arc::new(NetworkStatus::new(online));
    let view = Arc::new(ViewState::new(
        network.state(),
        ThemePreference::Light,
        chrono_tz::America::Sao_Paulo,
    ));
    let cancellation_token = CancellationToken::new();
    let orchestrator = Arc::new(Orchestrator::new(
        CacheStore::new(SqliteKvStore::new(pool), ThemePreference::Light),
        SunDataFetcher::new(
            client.clone(),
            format!("{}/json", server.uri()),
            14,
            cancellation_token.clone(),
        ),
        view.clone(),
        network,
        cancellation_token,
    ));
    let geocoder = Arc::new(GeocodingClient::new(
        client,
        format!("{}/v1/search", server.uri()),
        "pt".to_string(),
        "BR".to_string(),
        chrono_tz::America::Sao_Paulo,
    ));
    let assets = Arc::new(OfflineAssetStore::new(
        asset_dir.to_path_buf(),
        "sun-app-v3".to_string(),
    ));
    assets.install().await.unwrap();

    build_router(AppState {
        orchestrator,
        search: Arc::new(CitySearch::new(geocoder, Duration::from_millis(250))),
        view,
        assets,
    })
}

fn asset_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("icons")).unwrap();
    for asset in APP_ASSETS {
        let file = asset.trim_start_matches("./");
        let file = if file.is_empty() { "index.html" } else { file };
        std::fs::write(dir.path().join(file), format!("asset:{}", file)).unwrap();
    }
    dir
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn select_then_view_shows_localized_rows() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sun_body("2026-10-16T08:41:00+00:00")))
        .mount(&mock_server)
        .await;

    let dir = asset_dir();
    let app = app(&mock_server, dir.path(), true).await;

    let city = json!({ "name": "Santos", "lat": -23.96, "lon": -46.33, "tz": "America/Sao_Paulo" });
    let (status, body) = send(&app, json_request("POST", "/api/cities/select", city)).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["outcome"]["refreshed"]["applied"]["days"], 14);
    assert_eq!(body["view"]["rows"].as_array().unwrap().len(), 14);
    assert_eq!(body["view"]["rows"][0]["sunrise"], "05:41");
    assert_eq!(body["view"]["rows"][0]["sunset"], "18:10");
    assert_eq!(body["view"]["source"], "updated");

    let (status, body) = send(&app, get("/api/recent")).await;
    assert_eq!(status, StatusCode::OK);
    let recent: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(recent[0]["name"], "Santos");
}

#[tokio::test]
async fn refresh_with_all_days_failing_is_service_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = asset_dir();
    let app = app(&mock_server, dir.path(), true).await;

    let (status, _) = send(&app, json_request("POST", "/api/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let city = json!({ "name": "Santos", "lat": -23.96, "lon": -46.33, "tz": "America/Sao_Paulo" });
    send(&app, json_request("POST", "/api/cities/select", city)).await;

    let (status, body) = send(&app, json_request("POST", "/api/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Empty result"));
}

#[tokio::test]
async fn invalid_city_is_rejected() {
    let mock_server = MockServer::start().await;
    let dir = asset_dir();
    let app = app(&mock_server, dir.path(), false).await;

    let city = json!({ "name": "Nowhere", "lat": 123.0, "lon": 0.0, "tz": "UTC" });
    let (status, _) = send(&app, json_request("POST", "/api/cities/select", city)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn connectivity_and_theme_round_trip_through_view() {
    let mock_server = MockServer::start().await;
    let dir = asset_dir();
    let app = app(&mock_server, dir.path(), true).await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/api/connectivity", json!({ "online": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let view: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(view["network"], serde_json::to_value(NetworkState::Offline).unwrap());
    assert_eq!(view["status_label"], "🔴 Offline (usando cache)");

    let (_, body) = send(&app, json_request("POST", "/api/theme/toggle", json!({}))).await;
    let theme: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(theme["theme"], "dark");

    let (_, body) = send(&app, get("/api/theme")).await;
    let theme: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(theme["theme"], "dark");

    let (_, body) = send(&app, get("/api/view")).await;
    let view: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(view["theme"], "dark");
}

#[tokio::test]
async fn empty_search_returns_no_results() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = asset_dir();
    let app = app(&mock_server, dir.path(), true).await;

    let (status, body) = send(&app, get("/api/cities/search?q=%20")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["superseded"], false);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn serves_app_shell_from_snapshot() {
    let mock_server = MockServer::start().await;
    let dir = asset_dir();
    let app = app(&mock_server, dir.path(), true).await;

    std::fs::write(dir.path().join("index.html"), "changed on disk").unwrap();

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"asset:index.html");

    let (status, _) = send(&app, get("/assets/missing.js")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["service"], "sun-service");
}
