//! Integration tests for the transit adapter (wiremock-based)

use std::sync::Arc;
use std::time::Duration;

use application::ports::{StopsPort, VehiclesPort};
use application::{ApplicationError, PollingConfig, PollingController};
use domain::{CancellationToken, GeoLocation, MapRegion};
use infrastructure::TransitAdapter;
use integration_transit::TransitConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter_for(server: &MockServer) -> TransitAdapter {
    let config = TransitConfig::for_testing().with_base_url(&server.uri());
    TransitAdapter::from_config(&config).unwrap()
}

const fn nearby_json() -> &'static str {
    r#"[
        {
            "type": "stop",
            "id": "900100003",
            "name": "S+U Alexanderplatz",
            "location": { "type": "location", "latitude": 52.521508, "longitude": 13.411267 },
            "products": { "suburban": true, "subway": true, "tram": true, "bus": true }
        }
    ]"#
}

const fn radar_json() -> &'static str {
    r##"{
        "movements": [
            {
                "tripId": "1|31174|13|86|1032026",
                "direction": "S Spandau",
                "line": { "id": "s3", "name": "S3", "product": "suburban", "color": { "fg": "#fff", "bg": "#006ab3" } },
                "location": { "type": "location", "latitude": 52.5219, "longitude": 13.4115 }
            }
        ]
    }"##
}

// ============================================================================
// Port implementations
// ============================================================================

#[tokio::test]
async fn test_nearby_stops_through_port() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/nearby"))
        .and(query_param("distance", "1500"))
        .and(query_param("results", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_string(nearby_json()))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let stops = adapter
        .nearby_stops(GeoLocation::berlin(), 1500, 100, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].name, "S+U Alexanderplatz");
}

#[tokio::test]
async fn test_vehicles_through_port() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/radar"))
        .and(query_param("duration", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_string(radar_json()))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let vehicles = adapter
        .vehicles_in(MapRegion::berlin().bounding_box(), 30, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].display_name(), "S3");
}

#[tokio::test]
async fn test_server_error_maps_to_external_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/radar"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let err = adapter
        .vehicles_in(MapRegion::berlin().bounding_box(), 30, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.user_message(), "Network error: HTTP 503");
}

#[tokio::test]
async fn test_cancellation_maps_to_cancelled() {
    let server = MockServer::start().await;
    let adapter = adapter_for(&server);
    let token = CancellationToken::new();
    token.cancel();

    let result = adapter
        .nearby_stops(GeoLocation::berlin(), 1500, 100, &token)
        .await;

    assert_eq!(result, Err(ApplicationError::Cancelled));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ============================================================================
// Inherent operations
// ============================================================================

#[tokio::test]
async fn test_departures_normalize_planner_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stops/900100003/departures"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{ "departures": [] }"#))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let departures = adapter
        .departures(
            "A=1@O=S+U Alexanderplatz@X=13411267@Y=52521508@U=86@L=900100003@",
            60,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(departures.is_empty());
}

#[tokio::test]
async fn test_planner_departures_rejected_station() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stops/123/departures"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let result = adapter
        .planner_departures("123", 20, &CancellationToken::new())
        .await;

    assert_eq!(
        result,
        Err(ApplicationError::InvalidInput("Invalid station".to_string()))
    );
}

#[tokio::test]
async fn test_search_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations"))
        .and(query_param("query", "Alex"))
        .respond_with(ResponseTemplate::new(200).set_body_string(nearby_json()))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let stops = adapter
        .search_stops("  Alex ", 20, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stops.len(), 1);
}

#[tokio::test]
async fn test_missing_trip_route_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let route = adapter
        .trip_route("1|1|0|86|1032026", &CancellationToken::new())
        .await
        .unwrap();

    assert!(route.is_none());
}

// ============================================================================
// Polling end to end
// ============================================================================

#[tokio::test]
async fn test_polling_controller_over_adapter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/nearby"))
        .respond_with(ResponseTemplate::new(200).set_body_string(nearby_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/radar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(radar_json()))
        .mount(&server)
        .await;

    let adapter = Arc::new(adapter_for(&server));
    let handle = PollingController::spawn(
        adapter.clone(),
        adapter,
        PollingConfig::default(),
    )
    .unwrap();
    let mut snapshots = handle.subscribe();

    handle.region_changed(MapRegion::berlin()).await.unwrap();

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| !s.stops.is_empty() && !s.vehicles.is_empty()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.stops[0].id, "900100003");
    assert_eq!(snapshot.vehicles[0].trip_id, "1|31174|13|86|1032026");
    assert!(snapshot.error_message.is_none());
    assert!(!snapshot.loading_stops);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_polling_surfaces_stop_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/nearby"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/radar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(radar_json()))
        .mount(&server)
        .await;

    let adapter = Arc::new(adapter_for(&server));
    let config = PollingConfig {
        live_on_start: false,
        ..PollingConfig::default()
    };
    let handle = PollingController::spawn(adapter.clone(), adapter, config).unwrap();
    let mut snapshots = handle.subscribe();

    handle.region_changed(MapRegion::berlin()).await.unwrap();

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        snapshots.wait_for(|s| s.error_message.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.error_message.as_deref(), Some("Network error: HTTP 500"));
    assert!(snapshot.vehicles.is_empty());

    handle.shutdown().await.unwrap();
}
