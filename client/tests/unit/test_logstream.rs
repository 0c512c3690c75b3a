//! Log stream tests

use std::sync::Arc;
use std::time::Duration;

use jobdeck::logstream::client::{finished_marker, CONNECTED_MARKER, ERROR_MARKER};
use jobdeck::logstream::{LogIndicator, LogStreamClient, LogViewSession};
use jobdeck::transport::ChannelEvent;
use url::Url;

use crate::fakes::{settle, FakeConnector};

fn open(connector: &Arc<FakeConnector>, job_id: &str) -> LogStreamClient {
    let url = Url::parse(&format!("ws://localhost:8001/api/v1/jobs/{}/logs", job_id)).unwrap();
    LogStreamClient::open(connector.clone(), url, job_id)
}

fn close_with(code: u16) -> ChannelEvent {
    ChannelEvent::Closed {
        code: Some(code),
        reason: String::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_appends_connection_marker() {
    let connector = Arc::new(FakeConnector::default());
    let client = open(&connector, "job-1");
    assert_eq!(client.indicator(), LogIndicator::Connecting);

    settle().await;
    assert_eq!(client.indicator(), LogIndicator::Connected);
    assert_eq!(client.lines(), vec![CONNECTED_MARKER.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_lines_are_appended_verbatim_in_order() {
    let connector = Arc::new(FakeConnector::default());
    let client = open(&connector, "job-1");
    settle().await;

    let long_line = "x".repeat(10_000);
    for line in ["[download] 10%", "[download] 10%", "", long_line.as_str()] {
        connector.send_text(0, line);
    }
    settle().await;

    let lines = client.lines();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "[download] 10%");
    assert_eq!(lines[2], "[download] 10%");
    assert_eq!(lines[3], "");
    assert_eq!(lines[4].len(), 10_000);
}

#[tokio::test(start_paused = true)]
async fn test_status_message_marks_finished_without_closing() {
    let connector = Arc::new(FakeConnector::default());
    let client = open(&connector, "job-1");
    settle().await;

    connector.send_text(0, "Done.");
    connector.send_text(0, "JOB_STATUS:completed");
    settle().await;

    let view = client.view();
    assert_eq!(view.indicator, LogIndicator::Finished("completed".to_string()));
    assert_eq!(
        view.lines,
        vec![
            CONNECTED_MARKER.to_string(),
            "Done.".to_string(),
            finished_marker("completed"),
        ]
    );
    assert!(!view.ended);
    assert!(!connector.is_closed(0));

    // The server closes normally afterwards; the finished state stays
    connector.send(0, close_with(1000));
    settle().await;
    let view = client.view();
    assert_eq!(view.indicator, LogIndicator::Finished("completed".to_string()));
    assert!(view.ended);
    assert_eq!(view.lines.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_abnormal_close_shows_disconnected() {
    let connector = Arc::new(FakeConnector::default());
    let client = open(&connector, "job-1");
    settle().await;

    connector.send(0, close_with(1011));
    settle().await;

    assert_eq!(client.indicator(), LogIndicator::Disconnected);
    assert!(client.view().ended);

    // Log channels never reconnect
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_appends_marker() {
    let connector = Arc::new(FakeConnector::default());
    let client = open(&connector, "job-1");
    settle().await;

    connector.send(0, ChannelEvent::Error("connection reset".to_string()));
    settle().await;

    assert_eq!(client.indicator(), LogIndicator::Error);
    assert_eq!(client.lines().last().map(String::as_str), Some(ERROR_MARKER));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_open_is_an_error() {
    let connector = Arc::new(FakeConnector::default());
    connector.refuse(true);
    let client = open(&connector, "job-1");
    settle().await;

    let view = client.view();
    assert_eq!(view.indicator, LogIndicator::Error);
    assert_eq!(view.lines, vec![ERROR_MARKER.to_string()]);
    assert!(view.ended);
}

#[tokio::test(start_paused = true)]
async fn test_close_ignores_late_deliveries() {
    let connector = Arc::new(FakeConnector::default());
    let client = open(&connector, "job-1");
    settle().await;

    let mut log_rx = client.subscribe();
    log_rx.borrow_and_update();
    client.close();
    settle().await;

    assert!(connector.is_closed(0));
    assert!(!connector.send_text(0, "too late"));
    assert!(!log_rx.has_changed().unwrap_or(false));
}

#[tokio::test(start_paused = true)]
async fn test_switching_jobs_closes_previous_channel() {
    let connector = Arc::new(FakeConnector::default());
    let mut session = LogViewSession::new(connector.clone(), "http://localhost:8001/api/v1");

    session.show("a").unwrap();
    settle().await;
    connector.send_text(0, "a line 1");
    settle().await;

    let b_rx = session.show("b").unwrap().subscribe();
    settle().await;

    assert!(connector.is_closed(0));
    assert!(!connector.send_text(0, "a line 2"));
    connector.send_text(1, "b line 1");
    settle().await;

    let view = b_rx.borrow().clone();
    assert_eq!(view.job_id, "b");
    assert_eq!(view.lines, vec![CONNECTED_MARKER.to_string(), "b line 1".to_string()]);
    assert_eq!(connector.live(), 1);
    assert_eq!(
        connector.urls(),
        vec![
            "ws://localhost:8001/api/v1/jobs/a/logs".to_string(),
            "ws://localhost:8001/api/v1/jobs/b/logs".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_showing_same_job_keeps_channel() {
    let connector = Arc::new(FakeConnector::default());
    let mut session = LogViewSession::new(connector.clone(), "http://localhost:8001/api/v1");

    session.show("a").unwrap();
    settle().await;
    session.show("a").unwrap();
    settle().await;

    assert_eq!(connector.attempts(), 1);
    assert!(!connector.is_closed(0));
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_closes_channel() {
    let connector = Arc::new(FakeConnector::default());
    let mut session = LogViewSession::new(connector.clone(), "http://localhost:8001/api/v1");

    session.show("a").unwrap();
    settle().await;
    session.dismiss();
    settle().await;

    assert!(session.current().is_none());
    assert!(connector.is_closed(0));
    assert_eq!(connector.live(), 0);
}
