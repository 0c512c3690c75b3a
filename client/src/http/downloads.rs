//! Download submission API client

use job_api::{ArtistDownloadRequest, JobResponse, SearchDownloadRequest};
use tracing::info;

use crate::errors::ClientError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Queue a search-based download job
    pub async fn search_download(
        &self,
        query: &str,
        song_limit: Option<u32>,
    ) -> Result<JobResponse, ClientError> {
        let body = SearchDownloadRequest {
            query: query.to_string(),
            song_limit,
        };
        let response: JobResponse = self.post("/downloads/search", &body).await?;
        info!("Queued search download {} ({})", response.job_id, response.status);
        Ok(response)
    }

    /// Queue an artist download job
    pub async fn artist_download(
        &self,
        request: &ArtistDownloadRequest,
    ) -> Result<JobResponse, ClientError> {
        if request.artist_url.is_none() && request.artist_name.is_none() {
            return Err(ClientError::ConfigError(
                "artist download needs an artist URL or name".to_string(),
            ));
        }
        let response: JobResponse = self.post("/downloads/artist", request).await?;
        info!("Queued artist download {} ({})", response.job_id, response.status);
        Ok(response)
    }
}
