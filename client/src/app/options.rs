//! Application configuration options

use std::time::Duration;

use crate::app::settings::Settings;
use crate::logs::LogOptions;
use crate::sync::store::StoreOptions;
use crate::sync::stream::StreamOptions;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Backend API base URL
    pub backend_base_url: String,

    /// Keep a push connection to the job list
    pub enable_stream: bool,

    /// Enable polling worker
    pub enable_poller: bool,

    /// Job-list stream options
    pub stream: StreamOptions,

    /// Poller worker options
    pub poller: poller::Options,

    /// Job store options
    pub store: StoreOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:8001/api/v1".to_string(),
            enable_stream: true,
            enable_poller: true,
            stream: StreamOptions::default(),
            poller: poller::Options::default(),
            store: StoreOptions::default(),
        }
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            backend_base_url: settings.backend.base_url.clone(),
            enable_stream: settings.enable_stream,
            enable_poller: settings.enable_poller,
            stream: StreamOptions {
                reconnect_delay: Duration::from_secs(settings.reconnect_delay_secs.max(1)),
            },
            poller: poller::Options {
                interval: Duration::from_secs(settings.polling_interval_secs.max(1)),
                ..Default::default()
            },
            store: StoreOptions {
                refresh_after_cancel: settings.refresh_after_cancel,
            },
        }
    }
}

impl From<&Settings> for LogOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            log_level: settings.log_level.clone(),
            log_dir: settings.log_dir.clone(),
            json_format: settings.json_logs,
            ..Default::default()
        }
    }
}
