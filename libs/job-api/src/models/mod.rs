//! API models

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// All statuses in lifecycle order
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// No further transition is expected server-side
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether a cancel request makes sense for a job in this status
    pub fn is_cancellable(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// A unit of background work tracked by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque job ID
    pub id: String,

    /// Category tag, e.g. `search_download`, `artist_download`, `library_scan`
    pub job_type: String,

    /// Human-readable description of the work item
    pub target: String,

    pub status: JobStatus,

    /// Epoch seconds
    pub created_at: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<f64>,

    /// Failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Legacy inline log lines, superseded by the log stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
}

impl Job {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.created_at)
    }

    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        self.started_at.and_then(epoch_to_utc)
    }

    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        self.completed_at.and_then(epoch_to_utc)
    }

    /// Run time, when both start and end are known
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) if end >= start => Some(Duration::from_secs_f64(end - start)),
            _ => None,
        }
    }

    /// First segment of the ID, as shown in compact listings
    pub fn short_id(&self) -> &str {
        self.id.split('-').next().unwrap_or(&self.id)
    }
}

fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

/// Search download request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDownloadRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_limit: Option<u32>,
}

/// Artist download request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtistDownloadRequest {
    pub artist_url: Option<String>,
    pub artist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_album_length: Option<u32>,
}

/// Response to a job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub message: String,
    pub job_id: String,
    pub status: JobStatus,
}

/// Acknowledgement of a cancel request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
}

/// Library entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Directory,
    File,
}

/// Library file browser entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub path: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}
