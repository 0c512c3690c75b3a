//! Log tail connection for a single job
//!
//! Unlike the job-list stream this channel never reconnects: once a job has
//! finished its log is complete.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::transport::{ChannelEvent, Connector, NORMAL_CLOSURE};

/// Prefix of the control line the server sends once the job is done
pub const STATUS_PREFIX: &str = "JOB_STATUS:";

pub const CONNECTED_MARKER: &str = ">>> Connection established <<<";
pub const ERROR_MARKER: &str = ">>> WebSocket Error <<<";

pub fn finished_marker(status: &str) -> String {
    format!(">>> Job finished with status: {} <<<", status)
}

/// Connection indicator shown next to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogIndicator {
    Connecting,
    Connected,
    /// The server reported the job's final status
    Finished(String),
    Disconnected,
    Error,
}

impl fmt::Display for LogIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogIndicator::Connecting => f.write_str("CONNECTING"),
            LogIndicator::Connected => f.write_str("CONNECTED"),
            LogIndicator::Finished(status) => write!(f, "FINISHED ({})", status),
            LogIndicator::Disconnected => f.write_str("DISCONNECTED"),
            LogIndicator::Error => f.write_str("ERROR"),
        }
    }
}

/// An inbound log channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMessage<'a> {
    /// `JOB_STATUS:<status>`
    Status(&'a str),
    Line(&'a str),
}

impl<'a> LogMessage<'a> {
    pub fn classify(msg: &'a str) -> Self {
        match msg.strip_prefix(STATUS_PREFIX) {
            Some(rest) => LogMessage::Status(rest.split(':').next().unwrap_or(rest)),
            None => LogMessage::Line(msg),
        }
    }
}

/// What a log view renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    pub job_id: String,
    /// Append-only, in arrival order
    pub lines: Vec<String>,
    pub indicator: LogIndicator,
    /// The channel is gone; no further lines will arrive
    pub ended: bool,
}

struct Shared {
    alive: AtomicBool,
    view: watch::Sender<LogView>,
}

impl Shared {
    /// Apply `f` unless the client has been closed. Returns whether it ran.
    fn apply(&self, f: impl FnOnce(&mut LogView)) -> bool {
        let mut applied = false;
        self.view.send_if_modified(|view| {
            if !self.alive.load(Ordering::SeqCst) {
                return false;
            }
            f(view);
            applied = true;
            true
        });
        applied
    }

    fn kill(&self) {
        // Flip under the view lock so an in-progress apply finishes first
        self.view.send_if_modified(|_| {
            self.alive.store(false, Ordering::SeqCst);
            false
        });
    }
}

/// Tails the log of one job while a log view is open.
///
/// Dropping the client closes its channel.
pub struct LogStreamClient {
    job_id: String,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl LogStreamClient {
    /// Open the log channel for `job_id` at `url`
    pub fn open(connector: Arc<dyn Connector>, url: Url, job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        let (view, _) = watch::channel(LogView {
            job_id: job_id.clone(),
            lines: Vec::new(),
            indicator: LogIndicator::Connecting,
            ended: false,
        });
        let shared = Arc::new(Shared {
            alive: AtomicBool::new(true),
            view,
        });

        let task = tokio::spawn(run(shared.clone(), connector, url, job_id.clone()));

        Self {
            job_id,
            shared,
            task,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn subscribe(&self) -> watch::Receiver<LogView> {
        self.shared.view.subscribe()
    }

    pub fn view(&self) -> LogView {
        self.shared.view.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.shared.view.borrow().lines.clone()
    }

    pub fn indicator(&self) -> LogIndicator {
        self.shared.view.borrow().indicator.clone()
    }

    /// Close the channel. Anything still in flight is ignored.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for LogStreamClient {
    fn drop(&mut self) {
        self.shared.kill();
        self.task.abort();
        debug!("Log stream for job {} closed", self.job_id);
    }
}

async fn run(shared: Arc<Shared>, connector: Arc<dyn Connector>, url: Url, job_id: String) {
    let mut channel = match connector.connect(&url).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("Failed to open log stream for job {}: {}", job_id, e);
            shared.apply(|view| {
                view.indicator = LogIndicator::Error;
                view.lines.push(ERROR_MARKER.to_string());
                view.ended = true;
            });
            return;
        }
    };

    let opened = shared.apply(|view| {
        view.indicator = LogIndicator::Connected;
        view.lines.push(CONNECTED_MARKER.to_string());
    });
    if !opened {
        channel.close();
        return;
    }
    info!("Tailing logs for job {}", job_id);

    let mut closed_cleanly = false;
    while let Some(event) = channel.next_event().await {
        match event {
            ChannelEvent::Text(msg) => {
                let applied = shared.apply(|view| match LogMessage::classify(&msg) {
                    LogMessage::Status(status) => {
                        view.indicator = LogIndicator::Finished(status.to_string());
                        view.lines.push(finished_marker(status));
                    }
                    LogMessage::Line(line) => view.lines.push(line.to_string()),
                });
                if !applied {
                    return;
                }
            }
            ChannelEvent::Closed { code, .. } => {
                debug!("Log stream for job {} closed with code {:?}", job_id, code);
                closed_cleanly = code == Some(NORMAL_CLOSURE);
                break;
            }
            ChannelEvent::Error(e) => {
                warn!("Log stream for job {} failed: {}", job_id, e);
                shared.apply(|view| {
                    view.indicator = LogIndicator::Error;
                    view.lines.push(ERROR_MARKER.to_string());
                    view.ended = true;
                });
                return;
            }
        }
    }

    // A normal close is not an error; anything else, including the stream
    // vanishing without a close frame, shows as disconnected
    shared.apply(|view| {
        if !closed_cleanly {
            view.indicator = LogIndicator::Disconnected;
        }
        view.ended = true;
    });
}
