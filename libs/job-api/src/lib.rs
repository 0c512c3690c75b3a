//! Wire models for the job-processing service API
//!
//! Shared between the dashboard client and anything else that speaks to the
//! `/api/v1` surface.

pub mod models;

pub use models::{
    ArtistDownloadRequest, CancelResponse, FileKind, FileNode, Job, JobResponse, JobStatus,
    SearchDownloadRequest,
};
