//! jobdeck
//!
//! Client for a background job-processing service: keeps a local job list in
//! sync with the server over a push channel with a pull fallback, applies
//! optimistic cancels, and tails per-job logs.

pub mod app;
pub mod errors;
pub mod http;
pub mod logs;
pub mod logstream;
pub mod sync;
pub mod transport;
pub mod utils;
pub mod workers;
