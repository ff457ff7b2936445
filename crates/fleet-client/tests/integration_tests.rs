//! Integration tests for fleet-client
//!
//! These tests spin up a real fleet server and use the client to interact with it.
//! This keeps the client in sync with the API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use fleet_api::{create_router, AppState};
use fleet_client::testing::{wait_for, TestServer};
use fleet_client::{
    ActionEvent, ActionStatus, DeviceStatus, EventStream, FleetClient, FleetClientError,
    RegisterDeviceRequest,
};
use fleet_core::{
    ActionSimulator, DeviceRegistry, FixedOutcome, FleetService, OutcomeSource, SimulatorConfig,
};
use futures::StreamExt;
use pretty_assertions::assert_eq;

const ACTION_TIME: Duration = Duration::from_millis(200);
const POLL: Duration = Duration::from_millis(20);

fn service(outcome: impl OutcomeSource + 'static) -> Arc<FleetService> {
    let registry = Arc::new(DeviceRegistry::new());
    let config = SimulatorConfig {
        tick_ms: 20,
        ..Default::default()
    };
    let simulator = Arc::new(ActionSimulator::with_outcome_source(
        registry.clone(),
        config,
        Arc::new(outcome),
    ));
    Arc::new(FleetService::new(registry, simulator))
}

async fn start(service: Arc<FleetService>) -> TestServer {
    TestServer::start(create_router(AppState::new(service)))
        .await
        .expect("test server")
}

async fn start_default() -> TestServer {
    start(service(FixedOutcome::succeeding(ACTION_TIME))).await
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = start_default().await;
    assert_eq!(server.client.health().await.unwrap(), "OK");
}

// =============================================================================
// Devices
// =============================================================================

#[tokio::test]
async fn test_register_list_and_get() {
    let server = start_default().await;
    let client = &server.client;

    let request = RegisterDeviceRequest {
        id: "dev-2".into(),
        name: Some("Sensor".into()),
        device_type: Some("sensor".into()),
        status: Some("offline".into()),
    };
    let created = client.register_device(&request).await.unwrap();
    assert_eq!(created.status, DeviceStatus::Offline);

    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();

    let devices = client.list_devices().await.unwrap();
    let ids: Vec<_> = devices.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["dev-1", "dev-2"]);

    let fetched = client.get_device("dev-2").await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let server = start_default().await;
    let client = &server.client;

    let first = client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();
    let err = client
        .register_device(&RegisterDeviceRequest {
            name: Some("other".into()),
            ..RegisterDeviceRequest::new("dev-1")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FleetClientError::Conflict(_)));
    assert_eq!(client.get_device("dev-1").await.unwrap(), first);
}

#[tokio::test]
async fn test_empty_id_is_invalid() {
    let server = start_default().await;
    let err = server
        .client
        .register_device(&RegisterDeviceRequest::new(""))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetClientError::InvalidRequest(_)));
    assert!(server.client.list_devices().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_status() {
    let server = start_default().await;
    let client = &server.client;
    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();

    let change = client.set_device_status("dev-1", "MAINTENANCE").await.unwrap();
    assert_eq!(change.previous_status, DeviceStatus::Idle);
    assert_eq!(change.status, DeviceStatus::Maintenance);

    let err = client.set_device_status("dev-1", "asleep").await.unwrap_err();
    assert!(matches!(err, FleetClientError::InvalidRequest(_)));

    let err = client.set_device_status("missing", "IDLE").await.unwrap_err();
    assert!(matches!(err, FleetClientError::DeviceNotFound(_)));
    assert!(client.get_device("missing").await.unwrap_err().is_not_found());
}

// =============================================================================
// Actions
// =============================================================================

#[tokio::test]
async fn test_action_lifecycle() {
    let server = start_default().await;
    let client = &server.client;
    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();

    let params = BTreeMap::from([("version".to_string(), "2.0.0".to_string())]);
    let action = client
        .initiate_action("dev-1", "SOFTWARE_UPDATE", params.clone())
        .await
        .unwrap();
    assert_eq!(action.status, ActionStatus::Running);
    assert_eq!(action.params, params);

    let device = client.get_device("dev-1").await.unwrap();
    assert_eq!(device.status, DeviceStatus::Updating);
    assert_eq!(device.current_action_id.as_deref(), Some(action.id.as_str()));

    // One action per device
    let err = client
        .initiate_action("dev-1", "SYSTEM_REBOOT", BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FleetClientError::Conflict(msg) if msg.contains(&action.id)));

    let done = client.wait_for_action(&action.id, POLL).await.unwrap();
    assert_eq!(done.status, ActionStatus::Completed);
    assert!(done.completed_at.is_some());
    assert!(done.error_message.is_none());

    let device = client.get_device("dev-1").await.unwrap();
    assert_eq!(device.status, DeviceStatus::Idle);
    assert!(device.current_action_id.is_none());

    let history = client.list_device_actions("dev-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], done);
}

#[tokio::test]
async fn test_failed_action_marks_device_error() {
    let server = start(service(FixedOutcome::failing(ACTION_TIME))).await;
    let client = &server.client;
    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();

    let action = client
        .initiate_action("dev-1", "configuration-change", BTreeMap::new())
        .await
        .unwrap();
    let done = client.wait_for_action(&action.id, POLL).await.unwrap();
    assert_eq!(done.status, ActionStatus::Failed);
    assert_eq!(
        done.error_message.as_deref(),
        Some("Action simulation failed (random failure)")
    );

    let device = client.get_device("dev-1").await.unwrap();
    assert_eq!(device.status, DeviceStatus::Error);
    assert!(device.current_action_id.is_none());
}

#[tokio::test]
async fn test_action_errors() {
    let server = start_default().await;
    let client = &server.client;
    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();

    let err = client
        .initiate_action("ghost", "SYSTEM_REBOOT", BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FleetClientError::DeviceNotFound(_)));

    let err = client
        .initiate_action("dev-1", "SELF_DESTRUCT", BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FleetClientError::InvalidRequest(_)));

    let err = client.get_action("action_0_0").await.unwrap_err();
    assert!(matches!(err, FleetClientError::ActionNotFound(_)));

    let err = client.list_device_actions("ghost").await.unwrap_err();
    assert!(matches!(err, FleetClientError::DeviceNotFound(_)));
}

#[tokio::test]
async fn test_concurrent_devices() {
    let server = start_default().await;
    let client = &server.client;

    let mut action_ids = Vec::new();
    for i in 0..5 {
        let id = format!("dev-{}", i);
        client
            .register_device(&RegisterDeviceRequest::new(id.clone()))
            .await
            .unwrap();
        let action = client
            .initiate_action(&id, "FIRMWARE_UPDATE", BTreeMap::new())
            .await
            .unwrap();
        action_ids.push(action.id);
    }

    let ids = &action_ids;
    let all_done = wait_for(
        move || async move {
            for id in ids {
                match client.get_action(id).await {
                    Ok(action) if action.is_terminal() => {}
                    _ => return false,
                }
            }
            true
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(all_done);

    for device in client.list_devices().await.unwrap() {
        assert_eq!(device.status, DeviceStatus::Idle);
    }
}

#[tokio::test]
async fn test_shutdown_refuses_new_actions() {
    let service = service(FixedOutcome::succeeding(Duration::from_secs(30)));
    let server = start(service.clone()).await;
    let client = &server.client;
    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();
    client
        .register_device(&RegisterDeviceRequest::new("dev-2"))
        .await
        .unwrap();

    let running = client
        .initiate_action("dev-1", "SOFTWARE_UPDATE", BTreeMap::new())
        .await
        .unwrap();
    service.shutdown().await;

    let cancelled = client.get_action(&running.id).await.unwrap();
    assert_eq!(cancelled.status, ActionStatus::Failed);
    assert_eq!(cancelled.error_message.as_deref(), Some("Action was cancelled"));
    assert_eq!(
        client.get_device("dev-1").await.unwrap().status,
        DeviceStatus::Updating
    );

    let err = client
        .initiate_action("dev-2", "SYSTEM_REBOOT", BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FleetClientError::ServerError { status: 503, .. }));
}

// =============================================================================
// Events
// =============================================================================

async fn next_event(events: &mut EventStream) -> ActionEvent {
    tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .expect("event timeout")
        .expect("stream ended")
        .expect("bad event")
}

#[tokio::test]
async fn test_event_stream() {
    let server = start_default().await;
    let client = &server.client;
    for id in ["dev-1", "dev-2"] {
        client
            .register_device(&RegisterDeviceRequest::new(id))
            .await
            .unwrap();
    }

    let mut events = client.events(Some("dev-1")).await.unwrap();

    client
        .initiate_action("dev-2", "SYSTEM_REBOOT", BTreeMap::new())
        .await
        .unwrap();
    let action = client
        .initiate_action("dev-1", "SYSTEM_REBOOT", BTreeMap::new())
        .await
        .unwrap();

    let running = next_event(&mut events).await;
    assert_eq!(running.action_id, action.id);
    assert_eq!(running.status, ActionStatus::Running);

    let done = next_event(&mut events).await;
    assert_eq!(done.action_id, action.id);
    assert_eq!(done.device_id, "dev-1");
    assert_eq!(done.status, ActionStatus::Completed);
}

#[tokio::test]
async fn test_server_stops_with_open_event_stream() {
    let service = service(FixedOutcome::succeeding(Duration::from_secs(30)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(fleet_api::serve(
        listener,
        AppState::new(service.clone()),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let client = FleetClient::new(&format!("http://{}", addr)).unwrap();
    client
        .register_device(&RegisterDeviceRequest::new("dev-1"))
        .await
        .unwrap();
    let mut events = client.events(None).await.unwrap();
    let action = client
        .initiate_action("dev-1", "SOFTWARE_UPDATE", BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(next_event(&mut events).await.status, ActionStatus::Running);

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server kept running with an open event stream")
        .unwrap()
        .unwrap();

    // Shutdown ran and joined the worker
    assert!(service.simulator().get_action(&action.id).unwrap().was_cancelled());

    // And the event stream has ended
    tokio::time::timeout(Duration::from_secs(5), async {
        while events.next().await.is_some() {}
    })
    .await
    .expect("event stream still open");
}
