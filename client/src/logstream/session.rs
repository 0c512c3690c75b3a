//! Log view host
//!
//! Holds at most one open [`LogStreamClient`]. Switching jobs or dismissing
//! the view closes the previous client before anything new is opened, so
//! lines from one job never land in another job's view.

use std::sync::Arc;

use tracing::info;

use crate::errors::ClientError;
use crate::logstream::client::LogStreamClient;
use crate::transport::Connector;
use crate::utils::build_ws_url;

pub struct LogViewSession {
    connector: Arc<dyn Connector>,
    base_url: String,
    current: Option<LogStreamClient>,
}

impl LogViewSession {
    /// `base_url` is the HTTP API base; log channels live at `jobs/{id}/logs`
    pub fn new(connector: Arc<dyn Connector>, base_url: &str) -> Self {
        Self {
            connector,
            base_url: base_url.to_string(),
            current: None,
        }
    }

    /// Show the log of `job_id`. Re-showing the open job is a no-op.
    pub fn show(&mut self, job_id: &str) -> Result<&LogStreamClient, ClientError> {
        let already_open = matches!(&self.current, Some(client) if client.job_id() == job_id);

        if !already_open {
            let url = build_ws_url(&self.base_url, &format!("jobs/{}/logs", job_id))?;
            if let Some(previous) = self.current.take() {
                info!("Switching log view from job {} to {}", previous.job_id(), job_id);
                previous.close();
            }
            self.current = Some(LogStreamClient::open(self.connector.clone(), url, job_id));
        }

        self.current
            .as_ref()
            .ok_or_else(|| ClientError::Internal("log view has no open stream".to_string()))
    }

    /// Close the view and its channel
    pub fn dismiss(&mut self) {
        if let Some(client) = self.current.take() {
            info!("Closing log view for job {}", client.job_id());
            client.close();
        }
    }

    pub fn current(&self) -> Option<&LogStreamClient> {
        self.current.as_ref()
    }
}
