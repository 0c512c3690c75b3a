//! Poller worker tests

use std::sync::Arc;
use std::time::Duration;

use job_api::JobStatus;
use jobdeck::sync::store::{JobStateStore, StoreOptions};
use jobdeck::workers::poller;
use tokio::sync::oneshot;

use crate::fakes::{job, FakeApi};

#[tokio::test(start_paused = true)]
async fn test_poller_pulls_until_shutdown() {
    let api = Arc::new(FakeApi::with_jobs(vec![job("a", JobStatus::Queued)]));
    let store = JobStateStore::new(api.clone(), StoreOptions::default());
    let options = poller::Options {
        interval: Duration::from_secs(3),
        initial_delay: Duration::ZERO,
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let worker_store = store.clone();
    let worker = tokio::spawn(async move {
        let shutdown = Box::pin(async move {
            let _ = shutdown_rx.await;
        });
        poller::run(&options, &worker_store, tokio::time::sleep, shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.list_calls(), 1);
    assert_eq!(store.jobs().len(), 1);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(api.list_calls(), 3);

    shutdown_tx.send(()).unwrap();
    worker.await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_poller_survives_failed_pulls() {
    let api = Arc::new(FakeApi::with_jobs(vec![job("a", JobStatus::Running)]));
    let store = JobStateStore::new(api.clone(), StoreOptions::default());
    let options = poller::Options::default();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let worker_store = store.clone();
    let worker = tokio::spawn(async move {
        let shutdown = Box::pin(async move {
            let _ = shutdown_rx.await;
        });
        poller::run(&options, &worker_store, tokio::time::sleep, shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    api.fail_list();
    tokio::time::sleep(options_interval()).await;

    let view = store.view();
    assert_eq!(view.jobs.len(), 1);
    assert!(view.error.is_some());

    api.set_jobs(vec![]);
    tokio::time::sleep(options_interval()).await;
    let view = store.view();
    assert!(view.jobs.is_empty());
    assert!(view.error.is_none());

    shutdown_tx.send(()).unwrap();
    worker.await.unwrap();
}

fn options_interval() -> Duration {
    poller::Options::default().interval
}
