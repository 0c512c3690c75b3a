//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ClientError;
use crate::logs::LogLevel;

/// Client settings, read from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for a rolling log file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[serde(default)]
    pub json_logs: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Keep a push connection to the job list
    #[serde(default = "default_true")]
    pub enable_stream: bool,

    /// Periodically pull the job list
    #[serde(default = "default_true")]
    pub enable_poller: bool,

    /// Polling interval in seconds
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Job-list reconnect delay in seconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// Pull the job list after a cancel request resolves
    #[serde(default = "default_true")]
    pub refresh_after_cancel: bool,
}

fn default_true() -> bool {
    true
}

fn default_polling_interval() -> u64 {
    3
}

fn default_reconnect_delay() -> u64 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: None,
            json_logs: false,
            backend: BackendSettings::default(),
            enable_stream: true,
            enable_poller: true,
            polling_interval_secs: default_polling_interval(),
            reconnect_delay_secs: default_reconnect_delay(),
            refresh_after_cancel: true,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        debug!("Loading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,
}

fn default_backend_url() -> String {
    "http://localhost:8001/api/v1".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
        }
    }
}
