//! Per-job log tailing

pub mod client;
pub mod session;

pub use client::{LogIndicator, LogStreamClient, LogView};
pub use session::LogViewSession;
