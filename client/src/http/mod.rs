//! REST client for the job-processing service

pub mod client;
pub mod downloads;
pub mod jobs;
pub mod library;
