//! The per-job progress emitter handle.

use std::fmt;

use loci_types::{JobStatus, ProgressEvent};
use serde_json::Value;

use crate::registry::ProgressRegistry;

/// A partial progress report, merged over `{status: running}` defaults
/// when emitted.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    /// Completion percentage in `[0, 100]`.
    pub percent: Option<f64>,
    /// Explicit status override. Defaults to [`JobStatus::Running`].
    pub status: Option<JobStatus>,
    /// Human-readable status line.
    pub message: Option<String>,
    /// Opaque per-job-type payload.
    pub data: Option<Value>,
}

impl ProgressUpdate {
    /// An update carrying only a percentage.
    pub fn percent(percent: f64) -> Self {
        Self {
            percent: Some(percent),
            ..Self::default()
        }
    }

    /// An update carrying a percentage and a message.
    pub fn at(percent: f64, message: impl Into<String>) -> Self {
        Self {
            percent: Some(percent),
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Emitter for one job's progress events.
///
/// Cheap to clone; every emit is recorded as the job's last snapshot and
/// broadcast to its room. The registry does not police the status
/// lifecycle: a caller that emits after [`done`](Progress::done) reopens
/// the job as far as eviction is concerned.
#[derive(Clone)]
pub struct Progress {
    registry: ProgressRegistry,
    job_id: String,
}

impl Progress {
    pub(crate) fn new(registry: ProgressRegistry, job_id: String) -> Self {
        Self { registry, job_id }
    }

    /// The job this handle reports for.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Broadcast a progress report. Status defaults to `running`.
    pub fn emit(&self, update: ProgressUpdate) {
        self.registry.publish(ProgressEvent {
            job_id: self.job_id.clone(),
            percent: update.percent,
            status: Some(update.status.unwrap_or(JobStatus::Running)),
            message: update.message,
            data: update.data,
        });
    }

    /// Broadcast the terminal success snapshot:
    /// `{percent: 100, status: completed, data}`.
    pub fn done(&self, data: Option<Value>) {
        self.registry.publish(ProgressEvent {
            job_id: self.job_id.clone(),
            percent: Some(100.0),
            status: Some(JobStatus::Completed),
            message: None,
            data,
        });
    }

    /// Broadcast the terminal failure snapshot with a message derived
    /// from `err`.
    pub fn fail(&self, err: impl fmt::Display) {
        self.registry.publish(ProgressEvent {
            job_id: self.job_id.clone(),
            percent: None,
            status: Some(JobStatus::Error),
            message: Some(err.to_string()),
            data: None,
        });
    }
}
