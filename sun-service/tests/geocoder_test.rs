mod support;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use sun_service::geocoder::{CitySearch, GeocodingClient, SearchOutcome};
use support::http_client;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoder(server: &MockServer) -> Arc<GeocodingClient> {
    Arc::new(GeocodingClient::new(
        http_client(Duration::from_secs(2)),
        format!("{}/v1/search", server.uri()),
        "pt".to_string(),
        "BR".to_string(),
        chrono_tz::America::Sao_Paulo,
    ))
}

fn rio_results() -> serde_json::Value {
    json!({
        "results": [
            {
                "name": "Rio de Janeiro",
                "latitude": -22.90642,
                "longitude": -43.18223,
                "admin1": "Rio de Janeiro",
                "country": "Brasil",
                "country_code": "BR",
                "timezone": "America/Sao_Paulo"
            },
            {
                "name": "Río Cuarto",
                "latitude": -33.13067,
                "longitude": -64.34992,
                "admin1": "Córdoba",
                "country": "Argentina",
                "country_code": "AR",
                "timezone": "America/Argentina/Cordoba"
            },
            {
                "name": "Rio Branco",
                "latitude": -9.97472,
                "longitude": -67.81,
                "admin1": "Acre",
                "country": "Brasil",
                "country_code": "br",
                "timezone": "America/Rio_Branco"
            },
            {
                "name": "Rio Grande",
                "latitude": -32.035,
                "longitude": -52.09861,
                "country_code": "BR"
            }
        ]
    })
}

#[tokio::test]
async fn filters_to_country_and_keeps_upstream_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Rio"))
        .and(query_param("count", "5"))
        .and(query_param("language", "pt"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rio_results()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let suggestions = geocoder(&mock_server).resolve_candidates("Rio").await;

    let names: Vec<_> = suggestions.iter().map(|s| s.city.name.as_str()).collect();
    assert_eq!(names, ["Rio de Janeiro", "Rio Branco", "Rio Grande"]);
    assert_eq!(suggestions[0].label, "Rio de Janeiro, Rio de Janeiro — Brasil");
    assert_eq!(suggestions[1].city.tz, "America/Rio_Branco");
    assert_eq!(suggestions[2].city.tz, "America/Sao_Paulo");
    assert_eq!(suggestions[2].label, "Rio Grande");
}

#[tokio::test]
async fn upstream_failure_hides_suggestions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    assert!(geocoder(&mock_server).resolve_candidates("Rio").await.is_empty());
}

#[tokio::test]
async fn missing_results_field_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generationtime_ms": 0.5 })))
        .mount(&mock_server)
        .await;

    assert!(geocoder(&mock_server).resolve_candidates("Xyzzy").await.is_empty());
}

#[tokio::test]
async fn empty_query_never_hits_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rio_results()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let search = CitySearch::new(geocoder(&mock_server), Duration::from_millis(300));
    assert_eq!(search.search("").await, SearchOutcome::Suggestions(Vec::new()));
    assert_eq!(search.search("   ").await, SearchOutcome::Suggestions(Vec::new()));
}

#[tokio::test]
async fn repeated_query_within_quiet_period_issues_one_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Rio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rio_results()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let search = Arc::new(CitySearch::new(geocoder(&mock_server), Duration::from_millis(300)));

    let first = {
        let search = search.clone();
        tokio::spawn(async move { search.search("Rio").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = search.search("Rio").await;

    assert_eq!(first.await.unwrap(), SearchOutcome::Superseded);
    match second {
        SearchOutcome::Suggestions(results) => assert_eq!(results.len(), 3),
        SearchOutcome::Superseded => panic!("latest search should settle"),
    }
}
