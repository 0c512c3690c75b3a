//! Job-list stream tests

use std::sync::Arc;
use std::time::Duration;

use job_api::JobStatus;
use jobdeck::sync::store::{JobStateStore, StoreOptions};
use jobdeck::sync::stream::{ConnectionState, StreamConnectionManager, StreamOptions};
use jobdeck::transport::ChannelEvent;
use url::Url;

use crate::fakes::{job, settle, snapshot_json, FakeApi, FakeConnector};

const DELAY: Duration = Duration::from_secs(3);

fn setup() -> (Arc<FakeConnector>, JobStateStore, StreamConnectionManager) {
    let connector = Arc::new(FakeConnector::default());
    let store = JobStateStore::new(Arc::new(FakeApi::default()), StoreOptions::default());
    let manager = StreamConnectionManager::new(
        connector.clone(),
        Url::parse("ws://localhost:8001/api/v1/jobs").unwrap(),
        store.clone(),
        StreamOptions {
            reconnect_delay: DELAY,
        },
    );
    (connector, store, manager)
}

fn abnormal_close() -> ChannelEvent {
    ChannelEvent::Closed {
        code: Some(1006),
        reason: "abnormal".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_connect_reaches_connected() {
    let (connector, _store, manager) = setup();
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    manager.connect();
    assert_eq!(manager.state(), ConnectionState::Connecting);

    settle().await;
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(connector.urls(), vec!["ws://localhost:8001/api/v1/jobs".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_pushed_snapshots_replace_the_store() {
    let (connector, store, manager) = setup();
    manager.connect();
    settle().await;

    connector.send_text(0, &snapshot_json(&[job("a", JobStatus::Running)]));
    connector.send_text(
        0,
        &snapshot_json(&[job("a", JobStatus::Completed), job("b", JobStatus::Queued)]),
    );
    settle().await;

    let seen: Vec<_> = store.jobs().into_iter().map(|j| (j.id, j.status)).collect();
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), JobStatus::Completed),
            ("b".to_string(), JobStatus::Queued)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_keeps_connection() {
    let (connector, store, manager) = setup();
    manager.connect();
    settle().await;

    connector.send_text(0, "{\"not\": \"a snapshot\"}");
    connector.send_text(0, "garbage");
    settle().await;

    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(!connector.is_closed(0));
    assert!(!manager.reconnect_pending());

    connector.send_text(0, &snapshot_json(&[job("a", JobStatus::Queued)]));
    settle().await;
    assert_eq!(store.jobs().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_connect_twice_leaves_one_connection() {
    let (connector, _store, manager) = setup();
    manager.connect();
    settle().await;
    manager.connect();
    settle().await;

    assert_eq!(connector.attempts(), 2);
    assert!(connector.is_closed(0));
    assert_eq!(connector.live(), 1);
    assert_eq!(manager.state(), ConnectionState::Connected);

    // The superseded channel cannot deliver anymore
    assert!(!connector.send_text(0, &snapshot_json(&[])));
}

#[tokio::test(start_paused = true)]
async fn test_connect_while_connecting_leaves_one_connection() {
    let (connector, _store, manager) = setup();
    manager.connect();
    manager.connect();
    manager.connect();
    settle().await;

    assert_eq!(connector.live(), 1);
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_close_schedules_one_reconnect() {
    let (connector, _store, manager) = setup();
    manager.connect();
    settle().await;

    connector.send(0, abnormal_close());
    settle().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.reconnect_pending());

    tokio::time::sleep(DELAY - Duration::from_millis(100)).await;
    assert_eq!(connector.attempts(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(connector.attempts(), 2);
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(!manager.reconnect_pending());

    // No second timer was left behind
    tokio::time::sleep(DELAY * 5).await;
    assert_eq!(connector.attempts(), 2);
    assert_eq!(connector.live(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_connects_retry_once_per_delay() {
    let (connector, _store, manager) = setup();
    connector.refuse(true);
    manager.connect();
    settle().await;

    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.reconnect_pending());

    tokio::time::sleep(DELAY).await;
    assert_eq!(connector.attempts(), 2);
    tokio::time::sleep(DELAY).await;
    assert_eq!(connector.attempts(), 3);

    connector.refuse(false);
    tokio::time::sleep(DELAY).await;
    assert_eq!(connector.attempts(), 4);
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_schedules_nothing() {
    let (connector, _store, manager) = setup();
    manager.connect();
    settle().await;

    manager.disconnect();
    settle().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!manager.reconnect_pending());
    assert!(connector.is_closed(0));

    tokio::time::sleep(DELAY * 5).await;
    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let (connector, _store, manager) = setup();
    manager.connect();
    settle().await;

    connector.send(0, abnormal_close());
    settle().await;
    assert!(manager.reconnect_pending());

    manager.disconnect();
    assert!(!manager.reconnect_pending());

    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_normal_server_close_still_reconnects() {
    let (connector, _store, manager) = setup();
    manager.connect();
    settle().await;

    connector.send(
        0,
        ChannelEvent::Closed {
            code: Some(1000),
            reason: String::new(),
        },
    );
    tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
    assert_eq!(connector.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_manager_closes_connection() {
    let (connector, _store, manager) = setup();
    manager.connect();
    settle().await;

    drop(manager);
    settle().await;
    assert!(connector.is_closed(0));

    tokio::time::sleep(DELAY * 2).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_state_changes_are_published() {
    let (connector, _store, manager) = setup();
    let mut state_rx = manager.subscribe_state();

    manager.connect();
    settle().await;
    assert_eq!(*state_rx.borrow_and_update(), ConnectionState::Connected);

    connector.send(0, ChannelEvent::Error("reset by peer".to_string()));
    settle().await;
    assert!(state_rx.has_changed().unwrap());
    assert_eq!(*state_rx.borrow_and_update(), ConnectionState::Disconnected);
}
