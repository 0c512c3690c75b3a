//! One-shot CLI commands

use job_api::{ArtistDownloadRequest, JobResponse};
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::app::render::{render_files, status_label};
use crate::app::run::App;
use crate::errors::ClientError;
use crate::http::client::HttpClient;

fn print_submitted(response: &JobResponse) {
    println!(
        "{} {} ({})",
        response.message,
        response.job_id,
        status_label(response.status)
    );
}

pub async fn search(
    options: &AppOptions,
    query: &str,
    song_limit: Option<u32>,
) -> Result<JobResponse, ClientError> {
    let http = HttpClient::new(&options.backend_base_url)?;
    let response = http.search_download(query, song_limit).await?;
    print_submitted(&response);
    Ok(response)
}

pub async fn artist(
    options: &AppOptions,
    request: &ArtistDownloadRequest,
) -> Result<JobResponse, ClientError> {
    let http = HttpClient::new(&options.backend_base_url)?;
    let response = http.artist_download(request).await?;
    print_submitted(&response);
    Ok(response)
}

pub async fn scan(options: &AppOptions) -> Result<JobResponse, ClientError> {
    let http = HttpClient::new(&options.backend_base_url)?;
    let response = http.scan_library().await?;
    print_submitted(&response);
    Ok(response)
}

pub async fn files(options: &AppOptions, path: &str) -> Result<(), ClientError> {
    let http = HttpClient::new(&options.backend_base_url)?;
    let nodes = http.list_files(path).await?;
    print!("{}", render_files(&nodes));
    Ok(())
}

/// Cancel a job through the store, then report what the backend says
pub async fn cancel(options: AppOptions, job_id: &str) -> Result<(), ClientError> {
    let app = App::new(options)?;
    app.store.fetch_jobs().await?;

    let request = app.store.cancel_job(job_id)?;
    info!("Job {} marked cancelled locally", job_id);

    request
        .await
        .map_err(|e| ClientError::Internal(format!("cancel task failed: {}", e)))?;

    if !app.options().store.refresh_after_cancel {
        app.store.fetch_jobs().await?;
    }

    match app.store.job(job_id) {
        Some(job) => println!("Job {} is {}", job.id, status_label(job.status)),
        None => warn!("Job {} is no longer listed by the backend", job_id),
    }
    Ok(())
}
