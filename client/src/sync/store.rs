//! Canonical in-memory job collection

use std::collections::HashMap;
use std::sync::Arc;

use job_api::{Job, JobStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::ClientError;
use crate::sync::api::JobApi;

/// Error flag shown when a pull fails
pub const FETCH_ERROR: &str = "Failed to fetch jobs";

/// What subscribers render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobsView {
    /// Jobs in the order of the most recent authoritative snapshot
    pub jobs: Vec<Job>,

    /// A pull is in flight
    pub loading: bool,

    /// Set when the last pull failed; `jobs` then holds the last good collection
    pub error: Option<String>,
}

impl JobsView {
    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == job_id)
    }
}

/// Job store options
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Pull the job list once a cancel request has resolved
    pub refresh_after_cancel: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            refresh_after_cancel: true,
        }
    }
}

struct Inner {
    api: Arc<dyn JobApi>,
    options: StoreOptions,
    view: watch::Sender<JobsView>,
}

/// Job state store.
///
/// Local state is only ever replaced wholesale by server data (a pull or a
/// pushed snapshot). The one local edit is the optimistic cancel, which the
/// next snapshot overwrites unconditionally.
#[derive(Clone)]
pub struct JobStateStore {
    inner: Arc<Inner>,
}

impl JobStateStore {
    /// Create an empty store backed by `api`
    pub fn new(api: Arc<dyn JobApi>, options: StoreOptions) -> Self {
        let (view, _) = watch::channel(JobsView::default());
        Self {
            inner: Arc::new(Inner { api, options, view }),
        }
    }

    /// Receive every change to the view
    pub fn subscribe(&self) -> watch::Receiver<JobsView> {
        self.inner.view.subscribe()
    }

    /// Current view
    pub fn view(&self) -> JobsView {
        self.inner.view.borrow().clone()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.inner.view.borrow().jobs.clone()
    }

    pub fn job(&self, job_id: &str) -> Option<Job> {
        self.inner.view.borrow().job(job_id).cloned()
    }

    pub fn count_by_status(&self) -> HashMap<JobStatus, usize> {
        let mut counts = HashMap::new();
        for job in self.inner.view.borrow().jobs.iter() {
            *counts.entry(job.status).or_insert(0) += 1;
        }
        counts
    }

    /// Pull the full job collection.
    ///
    /// On failure the previous collection is kept and the error flag is set.
    pub async fn fetch_jobs(&self) -> Result<(), ClientError> {
        self.inner.view.send_modify(|view| view.loading = true);

        match self.inner.api.list_jobs().await {
            Ok(jobs) => {
                debug!("Fetched {} jobs", jobs.len());
                self.inner.view.send_modify(|view| {
                    view.jobs = jobs;
                    view.loading = false;
                    view.error = None;
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch jobs: {}", e);
                self.inner.view.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(FETCH_ERROR.to_string());
                });
                Err(e)
            }
        }
    }

    /// Cancel a queued or running job.
    ///
    /// The local copy flips to `cancelled` before this returns; the request
    /// itself runs on the returned task. A failed request is not rolled back
    /// here, the next snapshot decides.
    pub fn cancel_job(&self, job_id: &str) -> Result<JoinHandle<()>, ClientError> {
        let mut outcome = Err(ClientError::NotCancellable {
            id: job_id.to_string(),
            reason: "unknown job".to_string(),
        });

        self.inner.view.send_if_modified(|view| {
            let Some(job) = view.jobs.iter_mut().find(|job| job.id == job_id) else {
                return false;
            };
            if !job.status.is_cancellable() {
                outcome = Err(ClientError::NotCancellable {
                    id: job_id.to_string(),
                    reason: format!("job is {}", job.status),
                });
                return false;
            }
            job.status = JobStatus::Cancelled;
            outcome = Ok(());
            true
        });
        outcome?;

        info!("Cancelling job {}", job_id);
        let store = self.clone();
        let job_id = job_id.to_string();
        Ok(tokio::spawn(async move {
            match store.inner.api.cancel_job(&job_id).await {
                Ok(()) => debug!("Cancel request for job {} acknowledged", job_id),
                Err(e) => warn!(
                    "Cancel request for job {} failed, awaiting next snapshot: {}",
                    job_id, e
                ),
            }
            if store.inner.options.refresh_after_cancel {
                let _ = store.fetch_jobs().await;
            }
        }))
    }

    /// Replace the collection with an authoritative snapshot. Last one wins.
    pub fn apply_server_snapshot(&self, jobs: Vec<Job>) {
        debug!("Applying snapshot of {} jobs", jobs.len());
        self.inner.view.send_modify(|view| view.jobs = jobs);
    }
}
