//! Long-running client modes: watching the job list and tailing a job log

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::app::render::render_jobs;
use crate::errors::ClientError;
use crate::http::client::HttpClient;
use crate::logstream::{LogIndicator, LogViewSession};
use crate::sync::store::JobStateStore;
use crate::sync::stream::StreamConnectionManager;
use crate::transport::{Connector, WsConnector};
use crate::utils::build_ws_url;
use crate::workers::poller;

/// Wired-up client components
pub struct App {
    pub http: Arc<HttpClient>,
    pub connector: Arc<dyn Connector>,
    pub store: JobStateStore,
    pub stream: StreamConnectionManager,
    options: AppOptions,
}

impl App {
    /// Build the client against the configured backend over WebSocket
    pub fn new(options: AppOptions) -> Result<Self, ClientError> {
        let http = Arc::new(HttpClient::new(&options.backend_base_url)?);
        Self::with_connector(options, http, Arc::new(WsConnector::new()))
    }

    pub fn with_connector(
        options: AppOptions,
        http: Arc<HttpClient>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ClientError> {
        let store = JobStateStore::new(http.clone(), options.store.clone());
        let stream_url = build_ws_url(&options.backend_base_url, "jobs")?;
        let stream = StreamConnectionManager::new(
            connector.clone(),
            stream_url,
            store.clone(),
            options.stream.clone(),
        );

        Ok(Self {
            http,
            connector,
            store,
            stream,
            options,
        })
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    /// A fresh log view bound to this backend
    pub fn log_session(&self) -> LogViewSession {
        LogViewSession::new(self.connector.clone(), &self.options.backend_base_url)
    }

    fn spawn_poller(&self, shutdown_tx: &broadcast::Sender<()>) -> JoinHandle<()> {
        let store = self.store.clone();
        let options = self.options.poller.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let shutdown = Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            });
            poller::run(&options, &store, tokio::time::sleep, shutdown).await;
        })
    }
}

/// Keep the job list in sync and print it whenever it changes
pub async fn watch_jobs(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()>,
) -> Result<(), ClientError> {
    let app = App::new(options)?;
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let poller_handle = if app.options.enable_poller {
        Some(app.spawn_poller(&shutdown_tx))
    } else {
        let _ = app.store.fetch_jobs().await;
        None
    };
    if app.options.enable_stream {
        app.stream.connect();
    }

    let mut jobs_rx = app.store.subscribe();
    let mut state_rx = app.stream.subscribe_state();
    let mut last_rendered = None;
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, stopping job watch...");
                break;
            }
            changed = jobs_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = jobs_rx.borrow_and_update().clone();
                // Loading toggles alone do not warrant a redraw
                let key = (view.jobs.clone(), view.error.clone());
                if last_rendered.as_ref() != Some(&key) {
                    print!("{}", render_jobs(&view));
                    println!();
                    last_rendered = Some(key);
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                info!("Job-list stream is {:?}", state);
            }
        }
    }

    app.stream.disconnect();
    drop(shutdown_tx);
    if let Some(handle) = poller_handle {
        if let Err(e) = handle.await {
            warn!("Poller worker ended abnormally: {}", e);
        }
    }
    Ok(())
}

/// Print the log of one job until its channel ends
pub async fn tail_job(
    options: AppOptions,
    job_id: &str,
    shutdown_signal: impl Future<Output = ()>,
) -> Result<LogIndicator, ClientError> {
    let app = App::new(options)?;
    let mut session = app.log_session();
    let mut log_rx = session.show(job_id)?.subscribe();

    let mut printed = 0;
    let mut indicator = LogIndicator::Connecting;
    tokio::pin!(shutdown_signal);

    loop {
        let ended = {
            let view = log_rx.borrow_and_update();
            for line in &view.lines[printed..] {
                println!("{}", line);
            }
            printed = view.lines.len();
            if view.indicator != indicator {
                indicator = view.indicator.clone();
                info!("Log stream for job {} is {}", job_id, indicator);
            }
            view.ended
        };
        if ended {
            break;
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, closing log view...");
                break;
            }
            changed = log_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    session.dismiss();
    Ok(indicator)
}
