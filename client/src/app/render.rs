//! Plain-text rendering of the stores for the terminal host

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use job_api::{FileKind, FileNode, Job, JobStatus};

use crate::sync::store::JobsView;
use crate::utils::{format_bytes, format_duration};

pub fn status_label(status: JobStatus) -> ColoredString {
    let label = status.as_str().to_uppercase();
    match status {
        JobStatus::Queued => label.yellow(),
        JobStatus::Running => label.blue().bold(),
        JobStatus::Completed => label.green(),
        JobStatus::Failed => label.red().bold(),
        JobStatus::Cancelled => label.dimmed(),
    }
}

fn render_job(out: &mut String, job: &Job) {
    let _ = write!(
        out,
        "{:<10} {:<11} {:<16} {}",
        job.short_id(),
        status_label(job.status),
        job.job_type,
        job.target
    );
    if let Some(duration) = job.duration() {
        let _ = write!(out, " ({})", format_duration(duration));
    }
    out.push('\n');
    if let Some(error) = &job.error {
        let _ = writeln!(out, "           {}", error.red());
    }
}

/// Job list as a dashboard would show it, newest snapshot order preserved
pub fn render_jobs(view: &JobsView) -> String {
    let mut out = String::new();

    if let Some(error) = &view.error {
        let _ = writeln!(out, "{}", format!("! {} (showing last known state)", error).dimmed());
    }
    if view.jobs.is_empty() {
        let _ = writeln!(out, "No jobs yet.");
        return out;
    }
    for job in &view.jobs {
        render_job(&mut out, job);
    }
    out
}

/// Library listing
pub fn render_files(nodes: &[FileNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node.kind {
            FileKind::Directory => {
                let _ = writeln!(out, "{}/", node.name.blue().bold());
            }
            FileKind::File => {
                let _ = writeln!(out, "{:<48} {:>10}", node.name, format_bytes(node.size));
            }
        }
    }
    out
}
