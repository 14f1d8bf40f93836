//! HTTP tests for `OsrmLegProvider` against a mock OSRM server.

use std::sync::Arc;
use std::time::Duration;

use dispatch_core::{LegError, LegProvider, Order};
use dispatch_routing::{LegCache, OsrmLegProvider, OsrmLegProviderConfig, RetryPolicy, RouteStitcher};
use geo::Coord;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROUTE_PATH: &str = "/route/v1/driving/-86.78,36.16;-86.7,36.2";

fn from() -> Coord<f64> {
    Coord { x: -86.78, y: 36.16 }
}

fn to() -> Coord<f64> {
    Coord { x: -86.7, y: 36.2 }
}

fn route_body() -> serde_json::Value {
    json!({
        "code": "Ok",
        "routes": [{
            "distance": 9876.54,
            "duration": 654.0,
            "geometry": {
                "type": "LineString",
                "coordinates": [[-86.78, 36.16], [-86.74, 36.18], [-86.7, 36.2]]
            }
        }]
    })
}

#[tokio::test]
async fn fetches_and_converts_a_leg() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ROUTE_PATH))
        .and(query_param("overview", "full"))
        .and(query_param("geometries", "geojson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_body()))
        .expect(1)
        .mount(&server)
        .await;
    let provider = OsrmLegProvider::new(server.uri()).expect("provider should build");

    let leg = provider.fetch_leg(from(), to()).await.expect("leg");

    assert!((leg.distance_km - 9.877).abs() < 1e-9);
    assert!((leg.duration_minutes - 10.9).abs() < 1e-9);
    assert_eq!(leg.geometry.len(), 3);
    assert_eq!(leg.geometry.first(), Some(&from()));
    assert_eq!(leg.geometry.last(), Some(&to()));
    assert!(!leg.is_fallback);
}

#[tokio::test]
async fn non_success_status_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let provider = OsrmLegProvider::new(server.uri()).expect("provider should build");

    let err = provider.fetch_leg(from(), to()).await.expect_err("should fail");

    assert!(matches!(err, LegError::HttpError { status: 503, .. }));
}

#[tokio::test]
async fn service_codes_other_than_ok_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": "NoRoute", "message": "Impossible route"})),
        )
        .mount(&server)
        .await;
    let provider = OsrmLegProvider::new(server.uri()).expect("provider should build");

    let err = provider.fetch_leg(from(), to()).await.expect_err("should fail");

    assert_eq!(
        err,
        LegError::ServiceError {
            code: "NoRoute".to_owned(),
            message: "Impossible route".to_owned(),
        }
    );
}

#[tokio::test]
async fn malformed_bodies_are_parse_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;
    let provider = OsrmLegProvider::new(server.uri()).expect("provider should build");

    let err = provider.fetch_leg(from(), to()).await.expect_err("should fail");

    assert!(matches!(err, LegError::ParseError { .. }));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(route_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let config = OsrmLegProviderConfig::new(server.uri()).with_timeout(Duration::from_millis(100));
    let provider = OsrmLegProvider::with_config(config).expect("provider should build");

    let err = provider.fetch_leg(from(), to()).await.expect_err("should time out");

    assert!(matches!(err, LegError::Timeout { .. }));
}

#[tokio::test]
async fn stitcher_retries_then_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;
    let provider = OsrmLegProvider::new(server.uri()).expect("provider should build");
    let stitcher = RouteStitcher::new(provider)
        .with_cache(Arc::new(LegCache::default()))
        .with_retry(RetryPolicy::default().with_initial_backoff(Duration::from_millis(1)));
    let stops = vec![Order::new("only", 36.2, -86.7, 10.0)];

    let route = stitcher.stitch(from(), &stops).await;

    assert_eq!(route.legs.len(), 2);
    assert!(route.legs.iter().all(|leg| leg.is_fallback));
    assert!(route.has_fallback);
    assert_eq!(stitcher.cache().len(), 2);
}

#[tokio::test]
async fn stitcher_caches_successful_legs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_body()))
        .expect(1)
        .mount(&server)
        .await;
    let provider = OsrmLegProvider::new(server.uri()).expect("provider should build");
    let stitcher = RouteStitcher::new(provider).with_cache(Arc::new(LegCache::default()));

    let first = stitcher.leg(from(), to()).await;
    let second = stitcher.leg(from(), to()).await;

    assert_eq!(first, second);
    assert_eq!(stitcher.cache().hits(), 1);
}
