//! Network seam used by the job store

use async_trait::async_trait;
use job_api::Job;

use crate::errors::ClientError;

/// The request/response calls the job store needs from the backend
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Full job collection (`GET /jobs`)
    async fn list_jobs(&self) -> Result<Vec<Job>, ClientError>;

    /// Request cancellation (`POST /jobs/{id}/cancel`)
    async fn cancel_job(&self, job_id: &str) -> Result<(), ClientError>;
}
