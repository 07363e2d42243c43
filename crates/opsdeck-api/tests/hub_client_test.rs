// Integration tests for `HubClient` using wiremock.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opsdeck_api::types::{
    ControlAction, DeviceBulkUpdate, DeviceCategory, DeviceUpdates, DockerConnectionType,
    DockerSetupRequest, HostStatus, IncidentStatus, NewIncident, Severity, SourceType,
};
use opsdeck_api::{Error, HubClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HubClient) {
    let server = MockServer::start().await;
    let client = HubClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_dashboard_summary() {
    let (server, client) = setup().await;

    let body = json!({
        "hosts": { "total": 5, "by_status": { "online": 4, "offline": 1 } },
        "containers": { "total": 12, "by_status": { "running": 11, "exited": 1 } },
        "services": { "total": 7, "by_status": { "up": 7 } },
        "incidents": { "active": 1, "recent": [] }
    });

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let summary = client.dashboard().await.unwrap();

    assert_eq!(summary.hosts.total, 5);
    assert_eq!(summary.hosts.by_status.get("online"), Some(&4));
    assert_eq!(summary.containers.total, 12);
    assert_eq!(summary.incidents.active, 1);
}

#[tokio::test]
async fn test_get_host_with_nested_detail() {
    let (server, client) = setup().await;

    let body = json!({
        "id": 5,
        "name": "atlas",
        "host_type": "server",
        "ip": "10.0.0.5",
        "status": "online",
        "has_docker_integration": true,
        "hardware": { "cpu": "Ryzen 7 5800X", "cpu_cores": 8, "ram_gb": 64.0 },
        "containers": [
            { "id": 1, "host_id": 5, "name": "postgres", "image": "postgres:16", "status": "running" }
        ],
        "services": [
            { "id": 2, "host_id": 5, "name": "grafana", "url": "http://10.0.0.5:3000",
              "service_type": "http", "status": "up", "is_monitored": true }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/hosts/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let host = client.get_host(5).await.unwrap();

    assert_eq!(host.id, 5);
    assert_eq!(host.name, "atlas");
    assert_eq!(host.status, HostStatus::Online);
    assert!(host.has_docker_integration);
    assert_eq!(host.hardware.unwrap().cpu_cores, Some(8));
    assert_eq!(host.containers.len(), 1);
    assert_eq!(host.services.len(), 1);
}

#[tokio::test]
async fn test_setup_docker_failure_outcome() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/infrastructure/hosts/5/setup-docker"))
        .and(body_partial_json(json!({
            "connection_type": "tcp",
            "tcp_url": "tcp://10.0.0.5:2375"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connection_ok": false,
            "error": "dial timeout"
        })))
        .mount(&server)
        .await;

    let outcome = client
        .setup_docker(
            5,
            &DockerSetupRequest {
                connection_type: DockerConnectionType::Tcp,
                socket_path: None,
                tcp_url: Some("tcp://10.0.0.5:2375".into()),
                collect_stats: true,
            },
        )
        .await
        .unwrap();

    assert!(!outcome.connection_ok);
    assert!(outcome.sync_result.is_none());
    assert_eq!(outcome.error.as_deref(), Some("dial timeout"));
}

#[tokio::test]
async fn test_sync_containers_reports_count() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/infrastructure/containers/sync/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "containers_found": 9 })))
        .mount(&server)
        .await;

    let result = client.sync_containers(5).await.unwrap();
    assert_eq!(result.containers_found, 9);
}

#[tokio::test]
async fn test_list_incidents_with_status_filter() {
    let (server, client) = setup().await;

    let body = json!([{
        "id": 1,
        "title": "DB unreachable",
        "severity": "high",
        "status": "active",
        "started_at": "2024-05-01T14:00:00Z"
    }]);

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/incidents"))
        .and(query_param("status", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let incidents = client
        .list_incidents(Some(IncidentStatus::Active))
        .await
        .unwrap();

    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].title, "DB unreachable");
    assert_eq!(incidents[0].severity, Severity::High);
    assert!(incidents[0].resolved_at.is_none());
}

#[tokio::test]
async fn test_create_incident_sends_started_at() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/infrastructure/incidents"))
        .and(body_partial_json(json!({
            "title": "DB unreachable",
            "severity": "high",
            "status": "active"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "title": "DB unreachable",
            "severity": "high",
            "status": "active",
            "started_at": "2024-05-01T14:00:00Z"
        })))
        .mount(&server)
        .await;

    let created = client
        .create_incident(&NewIncident {
            title: "DB unreachable".into(),
            description: None,
            severity: Severity::High,
            status: IncidentStatus::Active,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            resolved_at: None,
            resolution: None,
        })
        .await
        .unwrap();

    assert_eq!(created.id, 7);
    assert_eq!(created.status, IncidentStatus::Active);
}

#[tokio::test]
async fn test_metrics_query_parameters() {
    let (server, client) = setup().await;

    let from = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();

    // Newest-first on the wire.
    let body = json!([
        { "recorded_at": "2024-05-01T23:00:00Z", "value": 61.2 },
        { "recorded_at": "2024-05-01T22:00:00Z", "value": 54.8 }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/metrics/query"))
        .and(query_param("source_type", "host"))
        .and(query_param("source_id", "5"))
        .and(query_param("metric_name", "cpu_percent"))
        .and(query_param("resolution", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let points = client
        .metrics_query(SourceType::Host, 5, "cpu_percent", from, to, "auto")
        .await
        .unwrap();

    assert_eq!(points.len(), 2);
    // The client does NOT reorder; normalization is the engine's job.
    assert!(points[0].recorded_at > points[1].recorded_at);
}

#[tokio::test]
async fn test_bulk_update_returns_partial_counts() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/infrastructure/smarthome/devices/bulk-update"))
        .and(body_partial_json(json!({
            "ids": [1, 2, 3],
            "updates": { "category": "lighting" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updated": 2,
            "failed": 1
        })))
        .mount(&server)
        .await;

    let result = client
        .bulk_update_devices(&DeviceBulkUpdate {
            ids: vec![1, 2, 3],
            updates: DeviceUpdates {
                category: Some(DeviceCategory::Lighting),
                ..DeviceUpdates::default()
            },
        })
        .await
        .unwrap();

    assert_eq!(result.updated, 2);
    assert_eq!(result.failed, 1);
}

#[tokio::test]
async fn test_bulk_update_move_to_unassigned_serializes_null() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/infrastructure/smarthome/devices/bulk-update"))
        .and(body_partial_json(json!({ "updates": { "room_id": null } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "updated": 2, "failed": 0 })),
        )
        .mount(&server)
        .await;

    let result = client
        .bulk_update_devices(&DeviceBulkUpdate {
            ids: vec![4, 5],
            updates: DeviceUpdates {
                room_id: Some(None),
                ..DeviceUpdates::default()
            },
        })
        .await
        .unwrap();

    assert_eq!(result.updated, 2);
    assert_eq!(result.failed, 0);
}

#[tokio::test]
async fn test_control_device_sends_action() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/infrastructure/smarthome/devices/9/control"))
        .and(body_partial_json(json!({ "action": "unlock" })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client
        .control_device(9, ControlAction::Unlock)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_success_body_is_ok_marker() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/infrastructure/smarthome/devices/3/favorite"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.favorite_device(3).await.unwrap();
}

#[tokio::test]
async fn test_discover_groups_by_domain() {
    let (server, client) = setup().await;

    let body = json!({
        "light": [
            { "entity_id": "light.kitchen", "friendly_name": "Kitchen", "is_registered": true },
            { "entity_id": "light.hall", "friendly_name": "Hall", "is_registered": false }
        ],
        "sensor": [
            { "entity_id": "sensor.outside_temp", "is_registered": false }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/smarthome/discover"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let discovered = client.discover_entities().await.unwrap();

    assert_eq!(discovered.len(), 2);
    assert_eq!(discovered["light"].len(), 2);
    assert!(discovered["light"][0].is_registered);
    assert!(!discovered["sensor"][0].is_registered);
}

#[tokio::test]
async fn test_multipart_upload_preserves_error_shape() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/infrastructure/hosts/5/attachments"))
        .respond_with(
            ResponseTemplate::new(413).set_body_json(json!({ "error": "file too large" })),
        )
        .mount(&server)
        .await;

    let err = client
        .upload("hosts/5/attachments", "file", "dump.log", vec![0u8; 64])
        .await
        .unwrap_err();

    match err {
        Error::Client {
            status, message, ..
        } => {
            assert_eq!(status, 413);
            assert_eq!(message, "file too large");
        }
        other => panic!("expected Client error, got {other}"),
    }
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_4xx_maps_to_client_error_with_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/hosts/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "host not found",
            "code": "not_found"
        })))
        .mount(&server)
        .await;

    let err = client.get_host(99).await.unwrap_err();

    match err {
        Error::Client {
            status,
            ref code,
            ref message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code.as_deref(), Some("not_found"));
            assert_eq!(message, "host not found");
        }
        ref other => panic!("expected Client error, got {other}"),
    }
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_4xx_without_body_uses_generic_fallback() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/infrastructure/incidents/3"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let err = client.delete_incident(3).await.unwrap_err();

    match err {
        Error::Client {
            status, message, ..
        } => {
            assert_eq!(status, 400);
            assert!(message.contains("400"), "fallback message: {message}");
        }
        other => panic!("expected Client error, got {other}"),
    }
}

#[tokio::test]
async fn test_5xx_maps_to_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/dashboard"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.dashboard().await.unwrap_err();

    match err {
        Error::Server { status, ref message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected Server error, got {other}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_undecodable_success_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/infrastructure/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>surprise</html>"))
        .mount(&server)
        .await;

    let err = client.list_hosts().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on this port.
    let client = HubClient::from_reqwest("http://127.0.0.1:1", reqwest::Client::new()).unwrap();

    let err = client.dashboard().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
