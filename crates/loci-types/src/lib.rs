//! Shared types for the loci backend routing layer.
//!
//! This crate defines the types used across the loci workspace:
//! backend node identity ([`Shard`], [`PoolKind`]), job progress
//! ([`JobStatus`], [`ProgressEvent`]), and the client-facing protocol
//! constants ([`protocol`]).

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod protocol;

// ---------------------------------------------------------------------------
// Backend node identity
// ---------------------------------------------------------------------------

/// One backend node instance, responsible for a subset of keys.
///
/// Resolved per-call by a pool resolver; holds only the connection
/// endpoint and is never mutated after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Connection endpoint, e.g. `"http://10.0.0.5:6379"`.
    pub url: String,
}

impl Shard {
    /// Create a shard from its endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// The kind of backend pool a key is routed within.
///
/// Each kind has its own configuration section, candidate node list,
/// and probing policy; keys are never routed across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Cache nodes (keyed entry storage).
    Cache,
    /// Tile-rendering nodes (session-affine render servers).
    TileRender,
}

impl PoolKind {
    /// All pool kinds, in registration order.
    pub const ALL: [PoolKind; 2] = [PoolKind::Cache, PoolKind::TileRender];

    /// Stable string name, used as a registry key and log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::Cache => "cache",
            PoolKind::TileRender => "tile-render",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job progress
// ---------------------------------------------------------------------------

/// Lifecycle status of an asynchronous job.
///
/// `Queued -> Running -> (Completed | Cancelled | Error)`, with `Running`
/// reachable repeatedly. The registry does not enforce transitions; this
/// is the vocabulary, not a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet started.
    Queued,
    /// In progress.
    Running,
    /// Finished successfully.
    Completed,
    /// Cancelled by the caller.
    Cancelled,
    /// Failed.
    Error,
}

impl JobStatus {
    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Error
        )
    }
}

/// One progress broadcast for a job — the wire format delivered to every
/// subscriber of the job's room.
///
/// Each event is a standalone snapshot, not a delta: the most recent event
/// for a job is also what a late subscriber receives on join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// The job this event belongs to.
    pub job_id: String,
    /// Completion percentage in `[0, 100]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Current lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    /// Human-readable status line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque per-job-type payload (shape varies by job category).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProgressEvent {
    /// Whether this event carries a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(|s| s.is_terminal())
    }
}
