//! Polling worker: periodic pull fallback for the job list

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::sync::store::JobStateStore;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Delay before the first pull
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            initial_delay: Duration::ZERO,
        }
    }
}

/// Run the poller worker until `shutdown_signal` resolves
pub async fn run<S, F>(
    options: &Options,
    store: &JobStateStore,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    tokio::select! {
        _ = &mut shutdown_signal => {
            info!("Poller worker shutting down...");
            return;
        }
        _ = sleep_fn(options.initial_delay) => {}
    }

    loop {
        debug!("Polling job list...");

        // The store keeps its last good collection on failure
        if let Err(e) = store.fetch_jobs().await {
            debug!("Poll failed: {}", e);
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}
