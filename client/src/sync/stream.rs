//! Job-list push connection
//!
//! State machine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --open--> Connected
//!      ^                                              |
//!      +-------- unexpected close (retry scheduled) --+
//! ```
//!
//! An unexpected close schedules exactly one reconnect after a fixed delay.
//! `disconnect()` cancels the pending reconnect and stays disconnected.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use job_api::Job;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::sync::store::JobStateStore;
use crate::transport::{ChannelEvent, Connector};

/// Job-list stream options
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Fixed delay before reconnecting after an unexpected close
    pub reconnect_delay: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Job-list connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Default)]
struct Control {
    /// Bumped on every connect/disconnect; older sessions are stale
    generation: u64,
    session: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    url: Url,
    store: JobStateStore,
    options: StreamOptions,
    state: watch::Sender<ConnectionState>,
    control: Mutex<Control>,
}

/// Owns the single job-list push connection and feeds its snapshots into
/// the [`JobStateStore`]
pub struct StreamConnectionManager {
    inner: Arc<Inner>,
}

impl StreamConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        url: Url,
        store: JobStateStore,
        options: StreamOptions,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                connector,
                url,
                store,
                options,
                state,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// A reconnect attempt is scheduled
    pub fn reconnect_pending(&self) -> bool {
        self.inner.lock_control().reconnect.is_some()
    }

    /// Open the connection, tearing down any existing one first
    pub fn connect(&self) {
        let mut control = self.inner.lock_control();
        Inner::start_session(&self.inner, &mut control);
    }

    /// Close the connection and cancel any pending reconnect
    pub fn disconnect(&self) {
        let mut control = self.inner.lock_control();
        control.generation += 1;

        if let Some(handle) = control.reconnect.take() {
            debug!("Cancelling scheduled job-list reconnect");
            handle.abort();
        }
        if let Some(handle) = control.session.take() {
            info!("Disconnecting job-list stream");
            handle.abort();
        }

        self.inner.set_state(ConnectionState::Disconnected);
    }
}

impl Drop for StreamConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Inner {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn start_session(inner: &Arc<Inner>, control: &mut Control) {
        if let Some(handle) = control.reconnect.take() {
            handle.abort();
        }
        if let Some(handle) = control.session.take() {
            debug!("Tearing down existing job-list connection");
            handle.abort();
        }

        control.generation += 1;
        let generation = control.generation;
        inner.set_state(ConnectionState::Connecting);

        let session_inner = inner.clone();
        control.session = Some(tokio::spawn(async move {
            session_inner.run_session(generation).await;
        }));
    }

    async fn run_session(self: Arc<Self>, generation: u64) {
        info!("Connecting to job-list stream: {}", self.url);

        let mut channel = match self.connector.connect(&self.url).await {
            Ok(channel) => channel,
            Err(e) => {
                error!("Failed to connect to job-list stream: {}", e);
                self.on_session_end(generation);
                return;
            }
        };

        if !self.mark_connected(generation) {
            channel.close();
            return;
        }

        while let Some(event) = channel.next_event().await {
            match event {
                ChannelEvent::Text(text) => match serde_json::from_str::<Vec<Job>>(&text) {
                    Ok(jobs) => {
                        if !self.deliver_snapshot(generation, jobs) {
                            debug!("Dropping snapshot from a superseded connection");
                            break;
                        }
                    }
                    Err(e) => warn!("Discarding malformed job-list message: {}", e),
                },
                ChannelEvent::Closed { code, reason } => {
                    warn!("Job-list stream closed (code {:?}): {}", code, reason);
                    break;
                }
                ChannelEvent::Error(e) => {
                    error!("Job-list stream error: {}", e);
                    break;
                }
            }
        }

        self.on_session_end(generation);
    }

    fn mark_connected(&self, generation: u64) -> bool {
        let control = self.lock_control();
        if control.generation != generation {
            return false;
        }
        info!("Connected to job-list stream");
        self.set_state(ConnectionState::Connected);
        true
    }

    /// Applies under the control lock so a concurrent connect/disconnect
    /// cannot interleave with a stale delivery
    fn deliver_snapshot(&self, generation: u64, jobs: Vec<Job>) -> bool {
        let control = self.lock_control();
        if control.generation != generation {
            return false;
        }
        self.store.apply_server_snapshot(jobs);
        true
    }

    fn on_session_end(self: &Arc<Self>, generation: u64) {
        let mut control = self.lock_control();
        if control.generation != generation {
            return;
        }

        control.session = None;
        self.set_state(ConnectionState::Disconnected);

        let delay = self.options.reconnect_delay;
        info!("Reconnecting job-list stream in {:?}", delay);

        let timer_inner = self.clone();
        control.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut control = timer_inner.lock_control();
            if control.generation != generation {
                return;
            }
            control.reconnect = None;
            Inner::start_session(&timer_inner, &mut control);
        }));
    }
}
