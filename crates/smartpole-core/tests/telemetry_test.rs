#![allow(clippy::unwrap_used)]
// Latest-reading fallback behaviour against a mocked console.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartpole_core::{Asset, ErrorKind, Metric, MetricGroup, SessionState};

use common::{AIR_PATH, POLE_PATH, SLOW, air_payload, config, dashboard, mount_login, pole_asset};

async fn server_with_login() -> MockServer {
    let server = MockServer::start().await;
    mount_login(&server, "tok", &[(12, "North Pole")]).await;
    server
}

#[tokio::test]
async fn test_timeout_on_fresh_process_returns_empty_stale() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_payload()).set_delay(SLOW))
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));
    let latest = dashboard.latest(MetricGroup::Air).await.unwrap();

    assert!(latest.success);
    assert!(latest.stale);
    assert!(latest.data.is_none());
}

#[tokio::test]
async fn test_failed_fetch_returns_previous_reading_unchanged() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .and(query_param("deviceId", "301"))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_payload()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));

    let first = dashboard.latest(MetricGroup::Air).await.unwrap();
    assert!(!first.stale);
    let reading = first.data.unwrap();
    assert_eq!(reading.get(Metric::Humidity), Some(40.0));

    let second = dashboard.latest(MetricGroup::Air).await.unwrap();
    assert!(second.success);
    assert!(second.stale);
    assert!(Arc::ptr_eq(&second.data.unwrap(), &reading));
}

#[tokio::test]
async fn test_incomplete_reading_is_not_cached() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_payload()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "co": 9, "no2": null, "so2": 9, "humidity": 9, "temperature": 9
        })))
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));

    let first = dashboard.latest(MetricGroup::Air).await.unwrap().data.unwrap();
    let second = dashboard.latest(MetricGroup::Air).await.unwrap();

    assert!(second.stale);
    assert!(second.message.unwrap().contains("no2"));
    assert_eq!(second.data.unwrap().get(Metric::Co), Some(1.0));
    assert_eq!(
        dashboard.telemetry().cache().last_complete(MetricGroup::Air),
        Some(first)
    );
}

#[tokio::test]
async fn test_air_water_reading_uses_both_devices() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path(POLE_PATH))
        .and(query_param("airDeviceId", "301"))
        .and(query_param("waterDeviceId", "302"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "co": 1, "no2": 2, "so2": 3, "humidity": 40, "temperature": 25, "pH": 7.4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));
    let latest = dashboard.latest(MetricGroup::AirWater).await.unwrap();

    assert!(!latest.stale);
    assert_eq!(latest.data.unwrap().get(Metric::Ph), Some(7.4));
    assert!(dashboard.telemetry().cache().last_complete(MetricGroup::Air).is_none());
}

#[tokio::test]
async fn test_no_matching_device_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut asset = pole_asset();
    asset.device_mut("302").unwrap().enabled = false;
    let (dashboard, _) = dashboard(config(&server, vec![asset]));

    let latest = dashboard.latest(MetricGroup::AirWater).await.unwrap();
    assert!(latest.success);
    assert!(latest.stale);
    assert!(latest.data.is_none());
    assert!(latest.message.unwrap().contains("water"));

    let (dashboard, _) = dashboard_without_assets(&server);
    let latest = dashboard.latest(MetricGroup::Air).await.unwrap();
    assert!(latest.message.unwrap().contains("no enabled asset"));
}

fn dashboard_without_assets(
    server: &MockServer,
) -> (smartpole_core::Dashboard, Arc<smartpole_core::MemoryStore>) {
    dashboard(config(server, Vec::<Asset>::new()))
}

#[tokio::test]
async fn test_cancelled_poll_returns_cached_reading() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_payload()))
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));
    let cached = dashboard.latest(MetricGroup::Air).await.unwrap().data.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let latest = dashboard.latest_until(MetricGroup::Air, &cancel).await.unwrap();

    assert!(latest.stale);
    assert!(Arc::ptr_eq(&latest.data.unwrap(), &cached));
    assert_eq!(latest.message.as_deref(), Some("request cancelled"));
}

#[tokio::test]
async fn test_poll_cancelled_during_login_leaves_no_login_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/doggoconsole/Authentication/Login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::login_body("tok", &[(12, "North Pole")]))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let latest = dashboard.latest_until(MetricGroup::Air, &cancel).await.unwrap();

    assert!(latest.stale);
    assert_eq!(latest.message.as_deref(), Some("request cancelled"));
    assert_eq!(dashboard.session_state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_unauthorized_fetch_invalidates_then_relogs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/doggoconsole/Authentication/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::login_body("tok", &[])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AIR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_payload()))
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));

    let first = dashboard.latest(MetricGroup::Air).await.unwrap();
    assert!(first.stale);
    assert_eq!(dashboard.session_state(), SessionState::Invalid);

    let second = dashboard.latest(MetricGroup::Air).await.unwrap();
    assert!(!second.stale);
    assert_eq!(dashboard.session_state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_login_failure_while_polling_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let (dashboard, _) = dashboard(config(&server, vec![pole_asset()]));
    let latest = dashboard.latest(MetricGroup::Air).await.unwrap();

    assert!(latest.success);
    assert!(latest.stale);
    assert!(latest.message.unwrap().contains("authentication failed"));
}

#[tokio::test]
async fn test_invalid_configuration_is_surfaced() {
    let server = MockServer::start().await;
    let mut config = config(&server, vec![pole_asset()]);
    config.connection.endpoint = "not a url".into();

    let (dashboard, _) = dashboard(config);
    let err = dashboard.latest(MetricGroup::Air).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
}
