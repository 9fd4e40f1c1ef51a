// Integration tests for `SmartThingsClient` and the event stream using wiremock.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartwash_api::{
    DeviceCommand, Error, Event, EventStreamHandle, ReconnectConfig, SmartThingsClient,
    StaticToken, StreamMessage, StreamTarget, Subscription, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SmartThingsClient) {
    let server = MockServer::start().await;
    let transport = TransportConfig::with_base_url(&format!("{}/v1", server.uri())).unwrap();
    let token = Arc::new(StaticToken::new(SecretString::from("pat-123".to_string())));
    let client = SmartThingsClient::new(token, &transport).unwrap();
    (server, client)
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_devices_follows_next_link() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer pat-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"deviceId": "d2", "label": "Dryer"}],
            "_links": {}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .and(header("authorization", "Bearer pat-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"deviceId": "d1", "label": "Washer"}],
            "_links": {"next": {"href": format!("{}/v1/devices?page=1", server.uri())}}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let devices = client.get_devices().await.unwrap();

    let ids: Vec<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d2"]);
    assert_eq!(devices[1].label, "Dryer");
}

#[tokio::test]
async fn test_get_device_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/d1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "components": {
                "main": {
                    "switch": {"switch": {"value": "on"}},
                    "samsungce.washerCycle": {
                        "washerCycle": {"value": "Table_00_Course_D0"},
                        "supportedCycles": {"value": null}
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let status = client.get_device_status("d1").await.unwrap();

    let main = &status["main"];
    assert_eq!(main["switch"]["switch"].value(), Some(&json!("on")));
    assert_eq!(main["samsungce.washerCycle"]["supportedCycles"].value(), None);
}

#[tokio::test]
async fn test_execute_device_command_posts_single_command() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/devices/d1/commands"))
        .and(body_json(json!({
            "commands": [{
                "component": "main",
                "capability": "samsungce.washerSpinLevel",
                "command": "setWasherSpinLevel",
                "arguments": ["800"]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .execute_device_command(
            "d1",
            DeviceCommand {
                component: "main".into(),
                capability: "samsungce.washerSpinLevel".into(),
                command: "setWasherSpinLevel".into(),
                arguments: Some(vec![json!("800")]),
            },
        )
        .await
        .unwrap();
}

// ── Rooms & scenes ──────────────────────────────────────────────────

#[tokio::test]
async fn test_rooms_and_scenes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/locations/loc/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"roomId": "r1", "locationId": "loc", "name": "Laundry"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/scenes"))
        .and(query_param("locationId", "loc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "sceneId": "s1",
                "sceneName": "Laundry done",
                "sceneIcon": "204",
                "sceneColor": null,
                "locationId": "loc"
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/scenes/s1/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let rooms = client.get_rooms("loc").await.unwrap();
    assert_eq!(rooms[0].name, "Laundry");

    let scenes = client.get_scenes("loc").await.unwrap();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].scene_name, "Laundry done");
    assert_eq!(scenes[0].scene_icon.as_deref(), Some("204"));
    assert_eq!(scenes[0].scene_color, None);

    client.execute_scene("s1").await.unwrap();
}

// ── Subscriptions ───────────────────────────────────────────────────

#[tokio::test]
async fn test_create_subscription_filters_location() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .and(body_partial_json(json!({
            "installedAppId": "app-1",
            "subscriptionFilters": [{
                "type": "LOCATIONIDS",
                "value": ["loc"],
                "eventType": ["DEVICE_EVENT", "DEVICE_LIFECYCLE_EVENT"]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub-1",
            "name": "smartwash",
            "registrationUrl": "https://sse.example/sub-1"
        })))
        .mount(&server)
        .await;

    let sub = client.create_subscription("loc", "app-1").await.unwrap();

    assert_eq!(sub.subscription_id, "sub-1");
    assert_eq!(sub.registration_url, "https://sse.example/sub-1");
}

#[tokio::test]
async fn test_create_subscription_limit_reached() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client.create_subscription("loc", "app-1").await.unwrap_err();
    assert!(matches!(err, Error::MaxConnectionsReached), "got {err:?}");
}

#[tokio::test]
async fn test_create_subscription_sink_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {"code": "ConstraintViolationError", "message": "sink unavailable"}
        })))
        .mount(&server)
        .await;

    let err = client.create_subscription("loc", "app-1").await.unwrap_err();
    match err {
        Error::Sink { message } => {
            assert_eq!(message, "ConstraintViolationError: sink unavailable");
        }
        other => panic!("expected Sink, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_missing_subscription_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/subscriptions/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.delete_subscription("gone").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_connection_error());
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_auth_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "UnauthorizedError", "message": "token expired"}
        })))
        .mount(&server)
        .await;

    let err = client.get_devices().await.unwrap_err();
    assert!(err.is_auth_failure());
    match err {
        Error::Authentication { message } => {
            assert_eq!(message, "UnauthorizedError: token expired");
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/d1/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.get_device_status("d1").await.unwrap_err();
    assert!(err.is_connection_error());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "503 Service Unavailable");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/locations/loc/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.get_rooms("loc").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_undecodable_non_ascii_body_is_deserialization_error() {
    let (server, client) = setup().await;

    // No deviceId, and a multi-byte character straddles byte 200.
    let prefix = r#"{"items":[{"label":""#;
    let label = format!("{}세탁기", "a".repeat(199 - prefix.len()));
    let body = format!(r#"{prefix}{label}"}}]}}"#);
    assert!(!body.is_char_boundary(200));

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "application/json"))
        .mount(&server)
        .await;

    let err = client.get_devices().await.unwrap_err();
    match err {
        Error::Deserialization { message, body: raw } => {
            assert!(message.contains("missing field"), "got {message}");
            assert_eq!(raw, body);
        }
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

// ── Event stream ────────────────────────────────────────────────────

#[tokio::test]
async fn test_event_stream_broadcasts_device_events() {
    let (server, client) = setup().await;

    let frame = json!({
        "eventType": "DEVICE_EVENT",
        "deviceEvent": {
            "eventId": "e1",
            "locationId": "loc",
            "deviceId": "d1",
            "componentId": "main",
            "capability": "switch",
            "attribute": "switch",
            "value": "off"
        }
    });
    let body = format!("event: DEVICE_EVENT\ndata: {frame}\n\n");

    Mock::given(method("GET"))
        .and(path("/sse/sub-1"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let handle = EventStreamHandle::spawn(
        Arc::new(client),
        StreamTarget {
            location_id: "loc".into(),
            installed_app_id: "app-1".into(),
            subscription: Subscription {
                subscription_id: "sub-1".into(),
                name: None,
                registration_url: format!("{}/sse/sub-1", server.uri()),
            },
        },
        ReconnectConfig::default(),
        cancel.clone(),
    );
    let mut rx = handle.subscribe();

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let StreamMessage::Event(Event::Device(event)) = msg.as_ref() else {
        panic!("expected device event, got {msg:?}");
    };
    assert_eq!(event.device_id, "d1");
    assert_eq!(event.value, json!("off"));

    handle.shutdown();
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_event_stream_recreates_expired_subscription() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/sse/old"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "new",
            "registrationUrl": format!("{}/sse/new", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sse/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(": keepalive\n\n", "text/event-stream"))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let handle = EventStreamHandle::spawn(
        Arc::new(client),
        StreamTarget {
            location_id: "loc".into(),
            installed_app_id: "app-1".into(),
            subscription: Subscription {
                subscription_id: "old".into(),
                name: None,
                registration_url: format!("{}/sse/old", server.uri()),
            },
        },
        ReconnectConfig::default(),
        cancel,
    );
    let mut rx = handle.subscribe();

    let mut changes = Vec::new();
    while changes.len() < 2 {
        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        if let StreamMessage::SubscriptionChanged(id) = msg.as_ref() {
            changes.push(id.clone());
        }
    }
    assert_eq!(changes, vec![None, Some("new".to_owned())]);

    handle.shutdown();
}
