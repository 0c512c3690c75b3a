//! Library API client

use job_api::{FileNode, JobResponse};

use crate::errors::ClientError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Start a full library scan job
    pub async fn scan_library(&self) -> Result<JobResponse, ClientError> {
        self.post_empty("/library/scan").await
    }

    /// List library entries below `path` (empty for the library root)
    pub async fn list_files(&self, path: &str) -> Result<Vec<FileNode>, ClientError> {
        self.get_with_query("/library/files", &[("path", path)]).await
    }
}
