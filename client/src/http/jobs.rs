//! Jobs API client

use async_trait::async_trait;
use job_api::{CancelResponse, Job};

use crate::errors::ClientError;
use crate::http::client::HttpClient;
use crate::sync::api::JobApi;

impl HttpClient {
    /// List all jobs known to the backend
    pub async fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
        self.get("/jobs").await
    }

    /// Get a single job
    pub async fn get_job(&self, job_id: &str) -> Result<Job, ClientError> {
        let path = format!("/jobs/{}", job_id);
        match self.get(&path).await {
            Err(ClientError::HttpStatus { status: 404, .. }) => {
                Err(ClientError::NotFound(format!("job {}", job_id)))
            }
            other => other,
        }
    }

    /// Request cancellation. The status change is observed later via a snapshot.
    pub async fn cancel_job(&self, job_id: &str) -> Result<CancelResponse, ClientError> {
        let path = format!("/jobs/{}/cancel", job_id);
        self.post_empty(&path).await
    }
}

#[async_trait]
impl JobApi for HttpClient {
    async fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
        HttpClient::list_jobs(self).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), ClientError> {
        HttpClient::cancel_job(self, job_id).await.map(|_| ())
    }
}
